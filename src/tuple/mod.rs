mod field;
pub use field::{Field, FieldType};

mod tuple;
pub use tuple::{Tuple, TupleDesc};
