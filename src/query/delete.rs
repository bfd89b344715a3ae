use crate::common::{Result, TransactionId};
use crate::tuple::{Field, Tuple};
use crate::Database;

/// Deletes every tuple produced by the child from its owning page, through
/// the buffer pool. Returns a one-field tuple with the number of deleted
/// records.
pub struct Delete<I> {
    tid: TransactionId,
    child: I,
}

impl<I: Iterator<Item = Result<Tuple>>> Delete<I> {
    pub fn new(tid: TransactionId, child: I) -> Self {
        Self { tid, child }
    }

    pub fn execute(self, db: &Database) -> Result<Tuple> {
        let mut deleted = 0i64;
        for tuple in self.child {
            db.buffer_pool().delete_tuple(self.tid, &tuple?)?;
            deleted += 1;
        }
        Ok(Tuple::new(vec![Field::Int(deleted)]))
    }
}
