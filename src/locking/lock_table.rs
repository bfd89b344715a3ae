use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use parking_lot::{Condvar, Mutex};

use crate::common::{EmberError, PageId, Permissions, Result, TransactionId};
use crate::locking::{DeadlockDetector, LockStatus};

/// One page's lock record: the state machine plus the condvar its blocked
/// acquirers sleep on.
struct LockEntry {
    status: Mutex<LockStatus>,
    released: Condvar,
}

impl LockEntry {
    fn new() -> Self {
        Self {
            status: Mutex::new(LockStatus::new()),
            released: Condvar::new(),
        }
    }
}

/// Maps every page to its lock record and arbitrates concurrent lock
/// requests. Requests on different pages proceed without contention; the
/// wait-for graph is shared and guarded as a whole, which is fine because
/// blocked requests are rare next to grants.
///
/// Lock records are created lazily and never reclaimed. Reclaiming an
/// empty record would race with waiters still parked on its condvar, and
/// the leak is bounded by the number of distinct pages ever locked.
pub struct LockTable {
    entries: Mutex<HashMap<PageId, Arc<LockEntry>>>,
    detector: Mutex<DeadlockDetector>,
}

impl LockTable {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            detector: Mutex::new(DeadlockDetector::new()),
        }
    }

    /// Acquires the lock on `pid` for `tid` at `perm`, blocking until it
    /// is granted. Fails with `Deadlock` when blocking would close a
    /// wait-for cycle; the check runs before the new edges are registered,
    /// so the requester that would have completed the cycle is the one
    /// aborted and the doomed edges never enter the graph.
    pub fn acquire(&self, pid: PageId, tid: TransactionId, perm: Permissions) -> Result<()> {
        let entry = {
            let mut entries = self.entries.lock();
            entries
                .entry(pid)
                .or_insert_with(|| Arc::new(LockEntry::new()))
                .clone()
        };

        let mut status = entry.status.lock();
        loop {
            let blockers = status.try_acquire(tid, perm);
            if blockers.is_empty() {
                // Granted: any edges registered while this request was
                // blocked are gone now.
                self.detector.lock().clear_waits(tid);
                return Ok(());
            }

            {
                let mut detector = self.detector.lock();
                if detector.would_deadlock(tid, &blockers) {
                    detector.clear_waits(tid);
                    debug!("{} would deadlock on page {}, aborting", tid, pid);
                    return Err(EmberError::Deadlock(tid));
                }
                detector.add_dependency(tid, &blockers);
            }

            debug!("{} waiting for {:?} on page {}", tid, perm, pid);
            entry.released.wait(&mut status);
        }
    }

    /// Releases `tid`'s hold on every page and purges it from the
    /// wait-for graph; it can no longer block anyone.
    pub fn release_all(&self, tid: TransactionId) {
        let entries: Vec<Arc<LockEntry>> = self.entries.lock().values().cloned().collect();
        for entry in entries {
            let mut status = entry.status.lock();
            if status.release(tid) {
                entry.released.notify_all();
            }
        }
        self.detector.lock().remove_transaction(tid);
        debug!("released all locks of {}", tid);
    }

    /// Releases only the hold on one page.
    pub fn release(&self, pid: PageId, tid: TransactionId) {
        let entry = self.entries.lock().get(&pid).cloned();
        if let Some(entry) = entry {
            let mut status = entry.status.lock();
            if status.release(tid) {
                entry.released.notify_all();
            }
        }
    }

    /// True iff `tid` holds a shared or exclusive lock on `pid`.
    pub fn holds_lock(&self, pid: PageId, tid: TransactionId) -> bool {
        let entry = self.entries.lock().get(&pid).cloned();
        match entry {
            Some(entry) => entry.status.lock().holds(tid),
            None => false,
        }
    }
}

impl Default for LockTable {
    fn default() -> Self {
        Self::new()
    }
}
