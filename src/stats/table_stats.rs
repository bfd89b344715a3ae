use crate::common::{EmberError, Result};
use crate::query::{Op, SeqScan};
use crate::stats::{IntHistogram, TextHistogram};
use crate::tuple::{Field, FieldType, TupleDesc};
use crate::Database;

enum ColumnStats {
    Int(Option<IntHistogram>),
    Text(TextHistogram),
}

/// Per-table statistics for query planning: tuple count, page count, and a
/// histogram per column. Built by scanning the table twice (a min/max pass
/// to size the integer histograms, then a fill pass) under a short-lived
/// transaction that commits once the scans are done.
pub struct TableStats {
    ntups: usize,
    num_pages: usize,
    io_cost_per_page: usize,
    columns: Vec<ColumnStats>,
    tuple_desc: TupleDesc,
}

impl TableStats {
    pub const NUM_HIST_BINS: usize = 100;

    pub fn new(db: &Database, table_id: u32, io_cost_per_page: usize) -> Result<Self> {
        let file = db.catalog().table(table_id)?;
        let tuple_desc = file.tuple_desc().clone();
        let num_fields = tuple_desc.num_fields();

        let txn = db.begin_transaction();

        let mut ntups = 0usize;
        let mut mins = vec![i64::MAX; num_fields];
        let mut maxs = vec![i64::MIN; num_fields];
        for tuple in SeqScan::new(db, txn.id(), table_id)? {
            let tuple = tuple?;
            for i in 0..num_fields {
                if let Field::Int(v) = tuple.field(i)? {
                    mins[i] = mins[i].min(*v);
                    maxs[i] = maxs[i].max(*v);
                }
            }
            ntups += 1;
        }

        let mut columns: Vec<ColumnStats> = (0..num_fields)
            .map(|i| match tuple_desc.field_type(i) {
                Ok(FieldType::Int) if ntups > 0 => ColumnStats::Int(Some(IntHistogram::new(
                    Self::NUM_HIST_BINS,
                    mins[i],
                    maxs[i],
                ))),
                Ok(FieldType::Int) | Err(_) => ColumnStats::Int(None),
                Ok(FieldType::Text) => ColumnStats::Text(TextHistogram::new(Self::NUM_HIST_BINS)),
            })
            .collect();

        for tuple in SeqScan::new(db, txn.id(), table_id)? {
            let tuple = tuple?;
            for (i, column) in columns.iter_mut().enumerate() {
                match (column, tuple.field(i)?) {
                    (ColumnStats::Int(Some(hist)), Field::Int(v)) => hist.add_value(*v),
                    (ColumnStats::Text(hist), Field::Text(s)) => hist.add_value(s),
                    _ => {}
                }
            }
        }

        txn.commit(db)?;

        Ok(Self {
            ntups,
            num_pages: file.num_pages()?,
            io_cost_per_page,
            columns,
            tuple_desc,
        })
    }

    /// Cost of a full sequential scan: every page is read once, and a
    /// mostly-empty last page costs as much as a full one.
    pub fn estimate_scan_cost(&self) -> f64 {
        self.num_pages as f64 * self.io_cost_per_page as f64
    }

    /// Expected tuple count after applying a predicate with the given
    /// selectivity.
    pub fn estimate_table_cardinality(&self, selectivity: f64) -> usize {
        (self.ntups as f64 * selectivity).floor() as usize
    }

    /// Estimated selectivity of `field op constant` on this table.
    pub fn estimate_selectivity(&self, field: usize, op: Op, constant: &Field) -> Result<f64> {
        let column = self
            .columns
            .get(field)
            .ok_or(EmberError::InvalidSlotIndex(field))?;
        match (column, constant) {
            (ColumnStats::Int(Some(hist)), Field::Int(v)) => Ok(hist.estimate_selectivity(op, *v)),
            (ColumnStats::Int(None), Field::Int(_)) => Ok(1.0),
            (ColumnStats::Text(hist), Field::Text(s)) => Ok(hist.estimate_selectivity(op, s)),
            _ => Err(EmberError::TypeMismatch),
        }
    }

    pub fn num_tuples(&self) -> usize {
        self.ntups
    }

    pub fn tuple_desc(&self) -> &TupleDesc {
        &self.tuple_desc
    }
}
