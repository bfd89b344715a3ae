use std::path::Path;

use log::debug;
use parking_lot::Mutex;

use crate::common::{EmberError, PageId, Result};
use crate::storage::{DiskFile, File, HeapPage, MemoryFile};
use crate::tuple::TupleDesc;

/// On-disk store for one table: an unordered collection of fixed-size
/// pages. This is the page source the buffer pool loads from and flushes
/// to; it performs pure I/O and no concurrency control beyond serializing
/// access to its backing file.
pub struct HeapFile {
    table_id: u32,
    tuple_desc: TupleDesc,
    page_size: usize,
    slots_per_page: usize,
    file: Mutex<Box<dyn File>>,
}

impl HeapFile {
    pub fn new(
        table_id: u32,
        tuple_desc: TupleDesc,
        page_size: usize,
        slots_per_page: usize,
        file: Box<dyn File>,
    ) -> Self {
        Self {
            table_id,
            tuple_desc,
            page_size,
            slots_per_page,
            file: Mutex::new(file),
        }
    }

    pub fn open(
        table_id: u32,
        tuple_desc: TupleDesc,
        page_size: usize,
        slots_per_page: usize,
        path: &Path,
    ) -> Result<Self> {
        let file = DiskFile::open(path)?;
        Ok(Self::new(
            table_id,
            tuple_desc,
            page_size,
            slots_per_page,
            Box::new(file),
        ))
    }

    pub fn in_memory(
        table_id: u32,
        tuple_desc: TupleDesc,
        page_size: usize,
        slots_per_page: usize,
    ) -> Self {
        Self::new(
            table_id,
            tuple_desc,
            page_size,
            slots_per_page,
            Box::new(MemoryFile::new()),
        )
    }

    pub fn id(&self) -> u32 {
        self.table_id
    }

    pub fn tuple_desc(&self) -> &TupleDesc {
        &self.tuple_desc
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn num_pages(&self) -> Result<usize> {
        let size = self.file.lock().size()?;
        Ok((size + self.page_size - 1) / self.page_size)
    }

    /// Reads the on-disk representation of `pid`. Fails when the identity
    /// names another table or a page past the end of the file.
    pub fn read_page(&self, pid: PageId) -> Result<HeapPage> {
        self.check_pid(pid)?;
        let offset = pid.page_no as usize * self.page_size;
        let block = {
            let mut file = self.file.lock();
            if offset >= file.size()? {
                return Err(EmberError::PageOutOfRange(pid));
            }
            file.read_block(offset, self.page_size)?
        };
        HeapPage::from_bytes(&block)
    }

    /// Persists the page's current content at its offset. Safe to call for
    /// a page that was never written before: the backing file grows as
    /// needed.
    pub fn write_page(&self, page: &HeapPage) -> Result<()> {
        self.check_pid(page.id())?;
        let block = page.to_bytes(self.page_size)?;
        let offset = page.id().page_no as usize * self.page_size;
        self.file.lock().write_block(offset, &block)
    }

    /// Appends an empty page to the file and returns its identity. The
    /// empty page is written out immediately so a concurrent reader sees a
    /// well-formed block.
    pub fn allocate_page(&self) -> Result<PageId> {
        let mut file = self.file.lock();
        let page_no = (file.size()? / self.page_size) as u32;
        let pid = PageId::new(self.table_id, page_no);
        let page = HeapPage::empty(pid, self.slots_per_page);
        let block = page.to_bytes(self.page_size)?;
        file.write_block(page_no as usize * self.page_size, &block)?;
        debug!("table {}: allocated page {}", self.table_id, pid);
        Ok(pid)
    }

    fn check_pid(&self, pid: PageId) -> Result<()> {
        if pid.table_id != self.table_id {
            return Err(EmberError::Other(format!(
                "page {} does not belong to table {}",
                pid, self.table_id
            )));
        }
        Ok(())
    }
}
