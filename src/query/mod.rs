mod predicate;
pub use predicate::{Op, Predicate};

mod seq_scan;
pub use seq_scan::SeqScan;

mod filter;
pub use filter::Filter;

mod insert;
pub use insert::Insert;

mod delete;
pub use delete::Delete;

mod aggregate;
pub use aggregate::{AggregateOp, Aggregator};
