use crate::common::{Result, TransactionId};
use crate::tuple::{Field, Tuple};
use crate::Database;

/// Inserts every tuple produced by the child into a table, routing each
/// insertion through the buffer pool so the usual locking and dirtying
/// applies. Returns a one-field tuple with the number of inserted records.
pub struct Insert<I> {
    tid: TransactionId,
    table_id: u32,
    child: I,
}

impl<I: Iterator<Item = Result<Tuple>>> Insert<I> {
    pub fn new(tid: TransactionId, child: I, table_id: u32) -> Self {
        Self {
            tid,
            table_id,
            child,
        }
    }

    pub fn execute(self, db: &Database) -> Result<Tuple> {
        let mut inserted = 0i64;
        for tuple in self.child {
            db.buffer_pool().insert_tuple(self.tid, self.table_id, tuple?)?;
            inserted += 1;
        }
        Ok(Tuple::new(vec![Field::Int(inserted)]))
    }
}
