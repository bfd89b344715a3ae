use serde::{Deserialize, Serialize};

use crate::common::{EmberError, PageId, RecordId, Result, TransactionId};
use crate::tuple::Tuple;

/// One fixed-size page of a heap file: a vector of tuple slots.
///
/// The body is a bincode block padded with zeros up to the page size. The
/// dirty flag lives only in memory; a page read back from disk is always
/// clean.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeapPage {
    pid: PageId,
    slots: Vec<Option<Tuple>>,
    #[serde(skip)]
    dirty: Option<TransactionId>,
}

impl HeapPage {
    pub fn empty(pid: PageId, num_slots: usize) -> Self {
        Self {
            pid,
            slots: vec![None; num_slots],
            dirty: None,
        }
    }

    /// Decodes a page from its on-disk block and rebuilds the record id of
    /// every occupied slot.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut page: HeapPage =
            bincode::deserialize(bytes).map_err(|_| EmberError::Deserialization)?;
        let pid = page.pid;
        for (slot, tuple) in page.slots.iter_mut().enumerate() {
            if let Some(t) = tuple {
                t.set_record_id(Some(RecordId::new(pid, slot)));
            }
        }
        Ok(page)
    }

    /// Encodes the page into a block of exactly `page_size` bytes.
    pub fn to_bytes(&self, page_size: usize) -> Result<Vec<u8>> {
        let mut bytes =
            bincode::serialize(self).map_err(|e| EmberError::Other(e.to_string()))?;
        if bytes.len() > page_size {
            return Err(EmberError::PageSizeExceeded(bytes.len(), page_size));
        }
        bytes.resize(page_size, 0);
        Ok(bytes)
    }

    pub fn id(&self) -> PageId {
        self.pid
    }

    /// The transaction that last dirtied this page, or `None` if clean.
    pub fn is_dirty(&self) -> Option<TransactionId> {
        self.dirty
    }

    pub fn mark_dirty(&mut self, tid: Option<TransactionId>) {
        self.dirty = tid;
    }

    pub fn num_slots(&self) -> usize {
        self.slots.len()
    }

    pub fn num_tuples(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn has_free_slot(&self) -> bool {
        self.slots.iter().any(|s| s.is_none())
    }

    /// Places the tuple in the first free slot and assigns its record id.
    pub fn insert_tuple(&mut self, mut tuple: Tuple) -> Result<RecordId> {
        let pid = self.pid;
        for (slot, entry) in self.slots.iter_mut().enumerate() {
            if entry.is_none() {
                let rid = RecordId::new(pid, slot);
                tuple.set_record_id(Some(rid));
                *entry = Some(tuple);
                return Ok(rid);
            }
        }
        Err(EmberError::PageFull(pid))
    }

    /// Removes and returns the tuple at `rid`.
    pub fn delete_tuple(&mut self, rid: RecordId) -> Result<Tuple> {
        if rid.page_id != self.pid {
            return Err(EmberError::Other(format!(
                "record {:?} does not belong to page {}",
                rid, self.pid
            )));
        }
        let entry = self
            .slots
            .get_mut(rid.slot)
            .ok_or(EmberError::InvalidSlotIndex(rid.slot))?;
        entry.take().ok_or(EmberError::EmptySlot(rid.slot))
    }

    pub fn tuple(&self, slot: usize) -> Result<&Tuple> {
        self.slots
            .get(slot)
            .ok_or(EmberError::InvalidSlotIndex(slot))?
            .as_ref()
            .ok_or(EmberError::EmptySlot(slot))
    }

    /// Occupied slots in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Tuple> {
        self.slots.iter().filter_map(|s| s.as_ref())
    }
}
