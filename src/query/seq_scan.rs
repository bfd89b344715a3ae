use std::collections::VecDeque;

use crate::common::{PageId, Permissions, Result, TransactionId};
use crate::tuple::{Tuple, TupleDesc};
use crate::Database;

/// Sequential scan: yields every tuple of a table in page order, reading
/// each page through the buffer pool with `ReadOnly` permission under the
/// scanning transaction. The shared locks taken here stay held until the
/// transaction completes, like any other access.
pub struct SeqScan<'a> {
    db: &'a Database,
    tid: TransactionId,
    table_id: u32,
    tuple_desc: TupleDesc,
    num_pages: usize,
    page_cursor: usize,
    current: VecDeque<Tuple>,
}

impl<'a> SeqScan<'a> {
    pub fn new(db: &'a Database, tid: TransactionId, table_id: u32) -> Result<Self> {
        let file = db.catalog().table(table_id)?;
        Ok(Self {
            db,
            tid,
            table_id,
            tuple_desc: file.tuple_desc().clone(),
            num_pages: file.num_pages()?,
            page_cursor: 0,
            current: VecDeque::new(),
        })
    }

    /// Like `new`, but field names in the exposed schema are prefixed with
    /// `alias.`.
    pub fn with_alias(
        db: &'a Database,
        tid: TransactionId,
        table_id: u32,
        alias: &str,
    ) -> Result<Self> {
        let mut scan = Self::new(db, tid, table_id)?;
        scan.tuple_desc = scan.tuple_desc.with_alias(alias);
        Ok(scan)
    }

    pub fn tuple_desc(&self) -> &TupleDesc {
        &self.tuple_desc
    }

    /// Restarts the scan from the first page.
    pub fn rewind(&mut self) {
        self.page_cursor = 0;
        self.current.clear();
    }
}

impl Iterator for SeqScan<'_> {
    type Item = Result<Tuple>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(tuple) = self.current.pop_front() {
                return Some(Ok(tuple));
            }
            if self.page_cursor >= self.num_pages {
                return None;
            }
            let pid = PageId::new(self.table_id, self.page_cursor as u32);
            self.page_cursor += 1;
            match self
                .db
                .buffer_pool()
                .get_page(self.tid, pid, Permissions::ReadOnly)
            {
                Ok(page) => {
                    self.current = page.lock().iter().cloned().collect();
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
