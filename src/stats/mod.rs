mod histogram;
pub use histogram::{IntHistogram, TextHistogram};

mod table_stats;
pub use table_stats::TableStats;
