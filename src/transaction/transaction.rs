use log::debug;

use crate::common::{Result, TransactionId};
use crate::Database;

/// Handle for one unit of isolation. Obtained from
/// `Database::begin_transaction`; `commit` and `abort` consume the handle,
/// so a completed transaction cannot be reused.
#[derive(Debug)]
pub struct Transaction {
    id: TransactionId,
}

impl Transaction {
    pub(crate) fn new(id: TransactionId) -> Self {
        debug!("started {}", id);
        Self { id }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Commits: forces every page this transaction dirtied to disk, then
    /// releases its locks. The flush happens here, on the commit path,
    /// rather than inside `transaction_complete`.
    pub fn commit(self, db: &Database) -> Result<()> {
        db.buffer_pool().flush_pages(self.id)?;
        db.buffer_pool().transaction_complete(self.id, true);
        debug!("committed {}", self.id);
        Ok(())
    }

    /// Aborts: the buffer pool discards every page this transaction
    /// dirtied, so its writes are never observable afterwards, and its
    /// locks are released.
    pub fn abort(self, db: &Database) {
        db.buffer_pool().transaction_complete(self.id, false);
        debug!("aborted {}", self.id);
    }
}
