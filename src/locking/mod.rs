mod lock_status;
pub use lock_status::LockStatus;

mod deadlock;
pub use deadlock::DeadlockDetector;

mod lock_table;
pub use lock_table::LockTable;
