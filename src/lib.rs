pub mod buffer;
pub mod catalog;
pub mod common;
pub mod locking;
pub mod query;
pub mod stats;
pub mod storage;
pub mod transaction;
pub mod tuple;

pub use buffer::BufferPool;
pub use catalog::Catalog;
pub use common::{DatabaseConfig, EmberError, PageId, Permissions, RecordId, Result, TransactionId};
pub use storage::HeapFile;
pub use transaction::Transaction;
pub use tuple::{Field, FieldType, Tuple, TupleDesc};

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::info;

/// One database instance: the catalog, the buffer pool sitting in front of
/// it, and the transaction id source. Constructed once and passed by
/// reference to everything that needs table or page access; there is no
/// process-wide instance.
pub struct Database {
    config: DatabaseConfig,
    catalog: Arc<Catalog>,
    buffer_pool: Arc<BufferPool>,
    next_txn_id: AtomicU64,
}

impl Database {
    pub fn new(config: DatabaseConfig) -> Self {
        let catalog = Arc::new(Catalog::new());
        let buffer_pool = Arc::new(BufferPool::new(
            Arc::clone(&catalog),
            config.buffer_pool_capacity,
        ));
        info!(
            "database up: page_size={}, buffer_pool_capacity={}",
            config.page_size, config.buffer_pool_capacity
        );
        Self {
            config,
            catalog,
            buffer_pool,
            next_txn_id: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn buffer_pool(&self) -> &BufferPool {
        &self.buffer_pool
    }

    pub fn begin_transaction(&self) -> Transaction {
        let id = TransactionId(self.next_txn_id.fetch_add(1, Ordering::Relaxed));
        Transaction::new(id)
    }

    /// Creates a memory-backed table and registers it. Handy for tests and
    /// scratch data; contents die with the process.
    pub fn create_table(&self, name: &str, tuple_desc: TupleDesc) -> Result<u32> {
        let table_id = self.catalog.reserve_table_id();
        let file = HeapFile::in_memory(
            table_id,
            tuple_desc,
            self.config.page_size,
            self.config.slots_per_page,
        );
        self.catalog.add_table(Arc::new(file), name);
        Ok(table_id)
    }

    /// Opens (or creates) a disk-backed table at `path` and registers it.
    pub fn open_table(&self, name: &str, tuple_desc: TupleDesc, path: &Path) -> Result<u32> {
        let table_id = self.catalog.reserve_table_id();
        let file = HeapFile::open(
            table_id,
            tuple_desc,
            self.config.page_size,
            self.config.slots_per_page,
            path,
        )?;
        self.catalog.add_table(Arc::new(file), name);
        Ok(table_id)
    }

    /// Flushes every dirty cached page. Called on orderly shutdown.
    pub fn close(&self) -> Result<()> {
        self.buffer_pool.flush_all_pages()
    }
}
