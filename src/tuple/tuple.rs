use std::fmt;

use serde::{Deserialize, Serialize};

use crate::common::{EmberError, RecordId, Result};
use crate::tuple::{Field, FieldType};

/// Schema of a tuple: an ordered list of field types with optional names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TupleDesc {
    types: Vec<FieldType>,
    names: Vec<Option<String>>,
}

impl TupleDesc {
    pub fn new(types: Vec<FieldType>, names: Vec<Option<String>>) -> Self {
        debug_assert_eq!(types.len(), names.len());
        Self { types, names }
    }

    /// Schema with anonymous fields.
    pub fn unnamed(types: Vec<FieldType>) -> Self {
        let names = vec![None; types.len()];
        Self { types, names }
    }

    /// Concatenates two schemas, the left one's fields first.
    pub fn combine(left: &TupleDesc, right: &TupleDesc) -> TupleDesc {
        let mut types = left.types.clone();
        types.extend(right.types.iter().copied());
        let mut names = left.names.clone();
        names.extend(right.names.iter().cloned());
        TupleDesc { types, names }
    }

    pub fn num_fields(&self) -> usize {
        self.types.len()
    }

    pub fn field_type(&self, i: usize) -> Result<FieldType> {
        self.types
            .get(i)
            .copied()
            .ok_or(EmberError::InvalidSlotIndex(i))
    }

    pub fn field_name(&self, i: usize) -> Result<Option<&str>> {
        self.names
            .get(i)
            .map(|n| n.as_deref())
            .ok_or(EmberError::InvalidSlotIndex(i))
    }

    /// Index of the first field with the given name.
    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.names
            .iter()
            .position(|n| n.as_deref() == Some(name))
            .ok_or_else(|| EmberError::Other(format!("no field named {}", name)))
    }

    /// Approximate per-tuple byte footprint, see `FieldType::byte_size`.
    pub fn byte_size(&self) -> usize {
        self.types.iter().map(FieldType::byte_size).sum()
    }

    /// Prefixes every field name with `alias.`, the way a scan exposes a
    /// table under an alias. Unnamed fields stay unnamed.
    pub fn with_alias(&self, alias: &str) -> TupleDesc {
        let names = self
            .names
            .iter()
            .map(|n| n.as_ref().map(|n| format!("{}.{}", alias, n)))
            .collect();
        TupleDesc {
            types: self.types.clone(),
            names,
        }
    }

    /// True iff the tuple's field types match this schema exactly.
    pub fn matches(&self, tuple: &Tuple) -> bool {
        tuple.num_fields() == self.num_fields()
            && tuple
                .fields()
                .iter()
                .zip(&self.types)
                .all(|(f, t)| f.field_type() == *t)
    }
}

impl fmt::Display for TupleDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.num_fields() {
            if i != 0 {
                write!(f, ", ")?;
            }
            match self.types[i] {
                FieldType::Int => write!(f, "Int")?,
                FieldType::Text => write!(f, "Text")?,
            }
            if let Some(name) = &self.names[i] {
                write!(f, "({})", name)?;
            }
        }
        Ok(())
    }
}

/// One row of a table. The record id is assigned when the tuple lands on a
/// page and is not part of the on-disk encoding; pages rebuild it from the
/// slot position on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tuple {
    fields: Vec<Field>,
    #[serde(skip)]
    rid: Option<RecordId>,
}

impl Tuple {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields, rid: None }
    }

    pub fn num_fields(&self) -> usize {
        self.fields.len()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, i: usize) -> Result<&Field> {
        self.fields.get(i).ok_or(EmberError::InvalidSlotIndex(i))
    }

    pub fn set_field(&mut self, i: usize, field: Field) -> Result<()> {
        let slot = self
            .fields
            .get_mut(i)
            .ok_or(EmberError::InvalidSlotIndex(i))?;
        *slot = field;
        Ok(())
    }

    pub fn record_id(&self) -> Option<RecordId> {
        self.rid
    }

    pub fn set_record_id(&mut self, rid: Option<RecordId>) {
        self.rid = rid;
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.fields.iter().enumerate() {
            if i != 0 {
                write!(f, "\t")?;
            }
            write!(f, "{}", field)?;
        }
        Ok(())
    }
}
