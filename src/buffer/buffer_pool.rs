use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use parking_lot::Mutex;

use crate::catalog::Catalog;
use crate::common::{EmberError, PageId, Permissions, RecordId, Result, TransactionId};
use crate::locking::LockTable;
use crate::storage::HeapPage;
use crate::tuple::Tuple;

/// Bounded cache of heap pages, and the single gate every page access goes
/// through. Before a page is returned the requesting transaction takes the
/// page's lock (shared for `ReadOnly`, exclusive for `ReadWrite`) and keeps
/// it until the transaction commits or aborts, so schedules are
/// conflict-serializable.
///
/// Eviction is NO-STEAL: a dirty page belongs to an in-flight transaction
/// and is the only copy that can still be rolled back by discarding, so
/// dirty pages are never evicted. When every cached page is dirty,
/// admitting a new page fails with `BufferFull`.
pub struct BufferPool {
    capacity: usize,
    catalog: Arc<Catalog>,
    lock_table: LockTable,
    pages: Mutex<HashMap<PageId, Arc<Mutex<HeapPage>>>>,
}

impl BufferPool {
    pub fn new(catalog: Arc<Catalog>, capacity: usize) -> Self {
        Self {
            capacity,
            catalog,
            lock_table: LockTable::new(),
            pages: Mutex::new(HashMap::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Retrieves the page `pid` on behalf of `tid` with the given
    /// permission. Blocks until the page lock is granted; fails with
    /// `Deadlock` if waiting would close a wait-for cycle, and with
    /// `BufferFull` if the page must be loaded but no clean victim can be
    /// evicted.
    ///
    /// The returned handle is the cached page itself: mutations through it
    /// are seen by every later request for the same page.
    pub fn get_page(
        &self,
        tid: TransactionId,
        pid: PageId,
        perm: Permissions,
    ) -> Result<Arc<Mutex<HeapPage>>> {
        self.lock_table.acquire(pid, tid, perm)?;

        let mut pages = self.pages.lock();
        if let Some(page) = pages.get(&pid) {
            return Ok(Arc::clone(page));
        }

        let file = self.catalog.table(pid.table_id)?;
        if pages.len() >= self.capacity {
            self.evict(&mut pages)?;
        }
        let page = Arc::new(Mutex::new(file.read_page(pid)?));
        pages.insert(pid, Arc::clone(&page));
        Ok(page)
    }

    /// Adds a tuple to the table on behalf of `tid`, taking `ReadWrite` on
    /// the page it lands on and marking that page dirty. Pages are probed
    /// first-fit; a probed page that turns out to be full is unlocked
    /// again (nothing on it was read or written), and when every page is
    /// full a fresh one is allocated through the page source.
    pub fn insert_tuple(
        &self,
        tid: TransactionId,
        table_id: u32,
        tuple: Tuple,
    ) -> Result<RecordId> {
        let file = self.catalog.table(table_id)?;
        if !file.tuple_desc().matches(&tuple) {
            return Err(EmberError::TypeMismatch);
        }

        for page_no in 0..file.num_pages()? {
            let pid = PageId::new(table_id, page_no as u32);
            let already_locked = self.holds_lock(tid, pid);
            let page = self.get_page(tid, pid, Permissions::ReadWrite)?;
            let mut guard = page.lock();
            if guard.has_free_slot() {
                let rid = guard.insert_tuple(tuple)?;
                guard.mark_dirty(Some(tid));
                return Ok(rid);
            }
            drop(guard);
            // Hand the lock back only if this probe took it; a hold from
            // earlier in the transaction must survive until commit.
            if !already_locked {
                self.release_page(tid, pid);
            }
        }

        let pid = file.allocate_page()?;
        let page = self.get_page(tid, pid, Permissions::ReadWrite)?;
        let mut guard = page.lock();
        let rid = guard.insert_tuple(tuple)?;
        guard.mark_dirty(Some(tid));
        Ok(rid)
    }

    /// Removes the tuple at its record id on behalf of `tid`, taking
    /// `ReadWrite` on the owning page and marking it dirty.
    pub fn delete_tuple(&self, tid: TransactionId, tuple: &Tuple) -> Result<()> {
        let rid = tuple
            .record_id()
            .ok_or_else(|| EmberError::Other("tuple has no record id".to_string()))?;
        let page = self.get_page(tid, rid.page_id, Permissions::ReadWrite)?;
        let mut guard = page.lock();
        guard.delete_tuple(rid)?;
        guard.mark_dirty(Some(tid));
        Ok(())
    }

    /// Releases `tid`'s lock on a single page before the transaction ends.
    ///
    /// Calling this is risky: a transaction that releases a lock early
    /// steps outside two-phase locking and forfeits the isolation
    /// guarantee for that page. The one sanctioned internal caller is
    /// `insert_tuple`, which hands back the lock on a page it probed and
    /// found full.
    pub fn release_page(&self, tid: TransactionId, pid: PageId) {
        self.lock_table.release(pid, tid);
    }

    /// True iff `tid` holds a lock on `pid`.
    pub fn holds_lock(&self, tid: TransactionId, pid: PageId) -> bool {
        self.lock_table.holds_lock(pid, tid)
    }

    /// Ends `tid`. On abort every page it dirtied is dropped from the
    /// cache unflushed, so the next read refetches the pre-transaction
    /// content from disk. On commit the pages are expected to be flushed
    /// already (`Transaction::commit` flushes before completing). Either
    /// way all of `tid`'s locks are released and it leaves the wait-for
    /// graph.
    pub fn transaction_complete(&self, tid: TransactionId, commit: bool) {
        if !commit {
            let mut pages = self.pages.lock();
            pages.retain(|_, page| page.lock().is_dirty() != Some(tid));
            debug!("{} aborted, dirty pages discarded", tid);
        }
        self.lock_table.release_all(tid);
    }

    /// Writes every page dirtied by `tid` back to its table's file and
    /// clears the dirty flags.
    pub fn flush_pages(&self, tid: TransactionId) -> Result<()> {
        let pages = self.pages.lock();
        for page in pages.values() {
            let mut guard = page.lock();
            if guard.is_dirty() == Some(tid) {
                self.write_back(&guard)?;
                guard.mark_dirty(None);
            }
        }
        Ok(())
    }

    /// Writes every dirty cached page back to disk, regardless of owner.
    pub fn flush_all_pages(&self) -> Result<()> {
        let pages = self.pages.lock();
        for page in pages.values() {
            let mut guard = page.lock();
            if guard.is_dirty().is_some() {
                self.write_back(&guard)?;
                guard.mark_dirty(None);
            }
        }
        Ok(())
    }

    /// Drops a page from the cache without flushing it. Recovery paths use
    /// this to make sure a rolled-back page is not served from cache.
    pub fn discard_page(&self, pid: PageId) {
        self.pages.lock().remove(&pid);
    }

    /// Number of pages currently cached; never exceeds the capacity.
    pub fn num_cached_pages(&self) -> usize {
        self.pages.lock().len()
    }

    pub fn is_cached(&self, pid: PageId) -> bool {
        self.pages.lock().contains_key(&pid)
    }

    /// Evicts one clean page to make room, writing it back first so the
    /// disk copy is current even if the page was never flushed before.
    /// Dirty pages are not candidates: evicting one would lose the only
    /// record of the pre-transaction state its owner may still roll back
    /// to. A flush failure propagates; it must not be swallowed here or a
    /// lost write would surface as silent corruption much later.
    fn evict(&self, pages: &mut HashMap<PageId, Arc<Mutex<HeapPage>>>) -> Result<()> {
        let victim = pages
            .iter()
            .find(|(_, page)| page.lock().is_dirty().is_none())
            .map(|(pid, page)| (*pid, Arc::clone(page)));

        match victim {
            Some((pid, page)) => {
                self.write_back(&page.lock())?;
                pages.remove(&pid);
                debug!("evicted page {}", pid);
                Ok(())
            }
            None => Err(EmberError::BufferFull),
        }
    }

    fn write_back(&self, page: &HeapPage) -> Result<()> {
        let file = self.catalog.table(page.id().table_id)?;
        file.write_page(page)
    }
}
