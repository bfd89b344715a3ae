use std::fmt;

use crate::common::{EmberError, Result};
use crate::tuple::{Field, Tuple};

/// Comparison operators a predicate can apply. `Like` is substring match
/// and only applies to text fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Equals,
    NotEquals,
    GreaterThan,
    GreaterThanOrEq,
    LessThan,
    LessThanOrEq,
    Like,
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Op::Equals => "=",
            Op::NotEquals => "!=",
            Op::GreaterThan => ">",
            Op::GreaterThanOrEq => ">=",
            Op::LessThan => "<",
            Op::LessThanOrEq => "<=",
            Op::Like => "LIKE",
        };
        write!(f, "{}", s)
    }
}

/// Compares one field of each incoming tuple against a constant operand.
#[derive(Debug, Clone)]
pub struct Predicate {
    field: usize,
    op: Op,
    operand: Field,
}

impl Predicate {
    pub fn new(field: usize, op: Op, operand: Field) -> Self {
        Self { field, op, operand }
    }

    pub fn field(&self) -> usize {
        self.field
    }

    pub fn op(&self) -> Op {
        self.op
    }

    pub fn operand(&self) -> &Field {
        &self.operand
    }

    /// True iff the tuple's field satisfies `field op operand`.
    pub fn eval(&self, tuple: &Tuple) -> Result<bool> {
        compare(tuple.field(self.field)?, self.op, &self.operand)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field[{}] {} {}", self.field, self.op, self.operand)
    }
}

/// Applies `op` to two fields of the same type; comparing an integer to a
/// text value is an error, not `false`.
pub(crate) fn compare(left: &Field, op: Op, right: &Field) -> Result<bool> {
    match (left, right) {
        (Field::Int(a), Field::Int(b)) => Ok(match op {
            Op::Equals | Op::Like => a == b,
            Op::NotEquals => a != b,
            Op::GreaterThan => a > b,
            Op::GreaterThanOrEq => a >= b,
            Op::LessThan => a < b,
            Op::LessThanOrEq => a <= b,
        }),
        (Field::Text(a), Field::Text(b)) => Ok(match op {
            Op::Equals => a == b,
            Op::NotEquals => a != b,
            Op::GreaterThan => a > b,
            Op::GreaterThanOrEq => a >= b,
            Op::LessThan => a < b,
            Op::LessThanOrEq => a <= b,
            Op::Like => a.contains(b.as_str()),
        }),
        _ => Err(EmberError::TypeMismatch),
    }
}
