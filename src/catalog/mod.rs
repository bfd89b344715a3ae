use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::common::{EmberError, Result};
use crate::storage::HeapFile;
use crate::tuple::TupleDesc;

/// Registry of the tables known to one database instance. Owned by the
/// `Database` context and handed to the components that need it; there is
/// no process-wide table registry.
pub struct Catalog {
    next_table_id: AtomicU32,
    tables: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    by_id: HashMap<u32, Arc<HeapFile>>,
    by_name: HashMap<String, u32>,
}

impl Catalog {
    pub fn new() -> Self {
        Self {
            next_table_id: AtomicU32::new(0),
            tables: RwLock::new(Tables::default()),
        }
    }

    /// Reserves a fresh table id; the caller builds the heap file with it
    /// and then registers the file with `add_table`.
    pub fn reserve_table_id(&self) -> u32 {
        self.next_table_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Registers a table under a name. A table registered twice under the
    /// same name replaces the earlier entry, mirroring re-created tables.
    pub fn add_table(&self, file: Arc<HeapFile>, name: &str) {
        let mut tables = self.tables.write();
        tables.by_name.insert(name.to_string(), file.id());
        tables.by_id.insert(file.id(), file);
    }

    pub fn table(&self, table_id: u32) -> Result<Arc<HeapFile>> {
        self.tables
            .read()
            .by_id
            .get(&table_id)
            .cloned()
            .ok_or(EmberError::NoSuchTable(table_id))
    }

    pub fn table_named(&self, name: &str) -> Result<Arc<HeapFile>> {
        let tables = self.tables.read();
        let id = tables
            .by_name
            .get(name)
            .ok_or_else(|| EmberError::Other(format!("no table named {}", name)))?;
        tables
            .by_id
            .get(id)
            .cloned()
            .ok_or(EmberError::NoSuchTable(*id))
    }

    pub fn tuple_desc(&self, table_id: u32) -> Result<TupleDesc> {
        Ok(self.table(table_id)?.tuple_desc().clone())
    }

    pub fn table_ids(&self) -> Vec<u32> {
        self.tables.read().by_id.keys().copied().collect()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}
