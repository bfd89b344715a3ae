use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::common::{EmberError, Result};
use crate::tuple::{Field, Tuple};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateOp {
    Min,
    Max,
    Sum,
    Avg,
    Count,
}

#[derive(Debug, Default)]
struct Accumulator {
    count: i64,
    sum: i64,
    min: i64,
    max: i64,
}

/// Incremental grouped aggregation over one field. Integer fields support
/// every operator; text fields only `Count`. Results come out as
/// `(group, value)` tuples, or a single `(value)` tuple without grouping,
/// in first-seen group order.
pub struct Aggregator {
    group_by: Option<usize>,
    agg_field: usize,
    op: AggregateOp,
    groups: HashMap<Option<Field>, Accumulator>,
    order: Vec<Option<Field>>,
}

impl Aggregator {
    pub fn new(group_by: Option<usize>, agg_field: usize, op: AggregateOp) -> Self {
        Self {
            group_by,
            agg_field,
            op,
            groups: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Folds one tuple into the running aggregate.
    pub fn merge(&mut self, tuple: &Tuple) -> Result<()> {
        let key = match self.group_by {
            Some(i) => Some(tuple.field(i)?.clone()),
            None => None,
        };
        let value = match tuple.field(self.agg_field)? {
            Field::Int(v) => Some(*v),
            Field::Text(_) => None,
        };
        if value.is_none() && self.op != AggregateOp::Count {
            return Err(EmberError::TypeMismatch);
        }

        let acc = match self.groups.entry(key.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                self.order.push(key);
                entry.insert(Accumulator {
                    min: i64::MAX,
                    max: i64::MIN,
                    ..Accumulator::default()
                })
            }
        };
        acc.count += 1;
        if let Some(v) = value {
            acc.sum += v;
            acc.min = acc.min.min(v);
            acc.max = acc.max.max(v);
        }
        Ok(())
    }

    /// Merges every tuple of an iterator, stopping on the first error.
    pub fn merge_all<I: Iterator<Item = Result<Tuple>>>(&mut self, tuples: I) -> Result<()> {
        for tuple in tuples {
            self.merge(&tuple?)?;
        }
        Ok(())
    }

    pub fn results(&self) -> Vec<Tuple> {
        self.order
            .iter()
            .map(|key| {
                let acc = &self.groups[key];
                let value = match self.op {
                    AggregateOp::Min => acc.min,
                    AggregateOp::Max => acc.max,
                    AggregateOp::Sum => acc.sum,
                    AggregateOp::Avg => (acc.sum as f64 / acc.count as f64).floor() as i64,
                    AggregateOp::Count => acc.count,
                };
                match key {
                    Some(group) => Tuple::new(vec![group.clone(), Field::Int(value)]),
                    None => Tuple::new(vec![Field::Int(value)]),
                }
            })
            .collect()
    }
}
