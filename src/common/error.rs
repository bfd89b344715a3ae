use thiserror::Error;

use crate::common::{PageId, TransactionId};

#[derive(Debug, Error)]
pub enum EmberError {
    #[error("transaction {0} aborted to break a deadlock")]
    Deadlock(TransactionId),

    #[error("buffer pool full: every cached page is dirty")]
    BufferFull,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no table with id {0}")]
    NoSuchTable(u32),

    #[error("page {0} is out of range for its table")]
    PageOutOfRange(PageId),

    #[error("page {0} has no free slot")]
    PageFull(PageId),

    #[error("page does not fit in a {1}-byte block: needs {0} bytes")]
    PageSizeExceeded(usize, usize),

    #[error("invalid slot index: {0}")]
    InvalidSlotIndex(usize),

    #[error("slot {0} is empty")]
    EmptySlot(usize),

    #[error("deserialization error")]
    Deserialization,

    #[error("field type mismatch")]
    TypeMismatch,

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, EmberError>;
