use emberdb::query::{AggregateOp, Aggregator, Delete, Filter, Insert, Op, Predicate, SeqScan};
use emberdb::stats::{IntHistogram, TableStats};
use emberdb::{Database, DatabaseConfig, Field, FieldType, Result, Tuple, TupleDesc};

fn test_db() -> Database {
    Database::new(DatabaseConfig {
        page_size: 4096,
        buffer_pool_capacity: 16,
        slots_per_page: 8,
    })
}

/// Table of (id, id % 5) rows, enough of them to span several pages.
fn seeded_table(db: &Database, rows: i64) -> Result<u32> {
    let td = TupleDesc::new(
        vec![FieldType::Int, FieldType::Int],
        vec![Some("id".to_string()), Some("bucket".to_string())],
    );
    let table_id = db.create_table("rows", td)?;
    let txn = db.begin_transaction();
    for i in 0..rows {
        let tuple = Tuple::new(vec![Field::Int(i), Field::Int(i % 5)]);
        db.buffer_pool().insert_tuple(txn.id(), table_id, tuple)?;
    }
    txn.commit(&db)?;
    Ok(table_id)
}

#[test]
fn test_scan_covers_every_page() -> Result<()> {
    let db = test_db();
    let table_id = seeded_table(&db, 30)?;

    // 30 rows at 8 slots per page span 4 pages.
    assert!(db.catalog().table(table_id)?.num_pages()? >= 4);

    let txn = db.begin_transaction();
    let mut ids: Vec<i64> = SeqScan::new(&db, txn.id(), table_id)?
        .map(|t| match t?.field(0)? {
            Field::Int(v) => Ok(*v),
            _ => unreachable!(),
        })
        .collect::<Result<_>>()?;
    ids.sort_unstable();
    assert_eq!(ids, (0..30).collect::<Vec<_>>());
    txn.commit(&db)?;
    Ok(())
}

#[test]
fn test_scan_rewind() -> Result<()> {
    let db = test_db();
    let table_id = seeded_table(&db, 10)?;

    let txn = db.begin_transaction();
    let mut scan = SeqScan::new(&db, txn.id(), table_id)?;
    assert_eq!(scan.by_ref().count(), 10);
    scan.rewind();
    assert_eq!(scan.count(), 10);
    txn.commit(&db)?;
    Ok(())
}

#[test]
fn test_filter_operators() -> Result<()> {
    let db = test_db();
    let table_id = seeded_table(&db, 20)?;

    let txn = db.begin_transaction();
    let cases = [
        (Op::Equals, 5i64, 1usize),
        (Op::NotEquals, 5, 19),
        (Op::GreaterThan, 14, 5),
        (Op::GreaterThanOrEq, 14, 6),
        (Op::LessThan, 3, 3),
        (Op::LessThanOrEq, 3, 4),
    ];
    for (op, operand, expected) in cases {
        let scan = SeqScan::new(&db, txn.id(), table_id)?;
        let filter = Filter::new(Predicate::new(0, op, Field::Int(operand)), scan);
        assert_eq!(filter.count(), expected, "op {} {}", op, operand);
    }
    txn.commit(&db)?;
    Ok(())
}

#[test]
fn test_predicate_type_mismatch_is_an_error() -> Result<()> {
    let db = test_db();
    let table_id = seeded_table(&db, 5)?;

    let txn = db.begin_transaction();
    let scan = SeqScan::new(&db, txn.id(), table_id)?;
    let mut filter = Filter::new(
        Predicate::new(0, Op::Equals, Field::Text("five".to_string())),
        scan,
    );
    assert!(filter.next().unwrap().is_err());
    txn.commit(&db)?;
    Ok(())
}

#[test]
fn test_insert_operator_reports_count() -> Result<()> {
    let db = test_db();
    let td = TupleDesc::unnamed(vec![FieldType::Int, FieldType::Int]);
    let table_id = db.create_table("rows", td)?;

    let txn = db.begin_transaction();
    let fresh = (0..12i64).map(|i| Ok(Tuple::new(vec![Field::Int(i), Field::Int(0)])));
    let result = Insert::new(txn.id(), fresh, table_id).execute(&db)?;
    assert_eq!(result.field(0)?, &Field::Int(12));
    txn.commit(&db)?;

    let txn = db.begin_transaction();
    assert_eq!(SeqScan::new(&db, txn.id(), table_id)?.count(), 12);
    txn.commit(&db)?;
    Ok(())
}

#[test]
fn test_delete_operator_removes_matches() -> Result<()> {
    let db = test_db();
    let table_id = seeded_table(&db, 20)?;

    let txn = db.begin_transaction();
    let doomed: Vec<Tuple> = Filter::new(
        Predicate::new(1, Op::Equals, Field::Int(0)),
        SeqScan::new(&db, txn.id(), table_id)?,
    )
    .collect::<Result<_>>()?;
    let result = Delete::new(txn.id(), doomed.into_iter().map(Ok)).execute(&db)?;
    assert_eq!(result.field(0)?, &Field::Int(4));
    txn.commit(&db)?;

    let txn = db.begin_transaction();
    assert_eq!(SeqScan::new(&db, txn.id(), table_id)?.count(), 16);
    txn.commit(&db)?;
    Ok(())
}

#[test]
fn test_deleted_slots_are_reused() -> Result<()> {
    let db = test_db();
    let table_id = seeded_table(&db, 8)?;
    let file = db.catalog().table(table_id)?;
    let pages_before = file.num_pages()?;

    let txn = db.begin_transaction();
    let all: Vec<Tuple> =
        SeqScan::new(&db, txn.id(), table_id)?.collect::<Result<_>>()?;
    Delete::new(txn.id(), all.into_iter().map(Ok)).execute(&db)?;
    for i in 0..8i64 {
        let tuple = Tuple::new(vec![Field::Int(100 + i), Field::Int(0)]);
        db.buffer_pool().insert_tuple(txn.id(), table_id, tuple)?;
    }
    txn.commit(&db)?;

    // First-fit insertion refills the emptied slots instead of growing.
    assert_eq!(file.num_pages()?, pages_before);
    Ok(())
}

#[test]
fn test_grouped_aggregates() -> Result<()> {
    let db = test_db();
    let table_id = seeded_table(&db, 20)?;

    let txn = db.begin_transaction();
    let mut counts = Aggregator::new(Some(1), 0, AggregateOp::Count);
    counts.merge_all(SeqScan::new(&db, txn.id(), table_id)?)?;
    let results = counts.results();
    assert_eq!(results.len(), 5);
    for row in &results {
        assert_eq!(row.field(1)?, &Field::Int(4));
    }

    let mut sums = Aggregator::new(Some(1), 0, AggregateOp::Sum);
    sums.merge_all(SeqScan::new(&db, txn.id(), table_id)?)?;
    // Group 0 holds ids 0, 5, 10, 15.
    let group0 = sums
        .results()
        .into_iter()
        .find(|r| r.field(0).unwrap() == &Field::Int(0))
        .unwrap();
    assert_eq!(group0.field(1)?, &Field::Int(30));
    txn.commit(&db)?;
    Ok(())
}

#[test]
fn test_ungrouped_aggregates() -> Result<()> {
    let db = test_db();
    let table_id = seeded_table(&db, 10)?;

    let txn = db.begin_transaction();
    for (op, expected) in [
        (AggregateOp::Min, 0i64),
        (AggregateOp::Max, 9),
        (AggregateOp::Sum, 45),
        (AggregateOp::Avg, 4),
        (AggregateOp::Count, 10),
    ] {
        let mut agg = Aggregator::new(None, 0, op);
        agg.merge_all(SeqScan::new(&db, txn.id(), table_id)?)?;
        let results = agg.results();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].field(0)?, &Field::Int(expected), "{:?}", op);
    }
    txn.commit(&db)?;
    Ok(())
}

#[test]
fn test_int_histogram_selectivities() {
    let mut hist = IntHistogram::new(10, 1, 100);
    for v in 1..=100 {
        hist.add_value(v);
    }

    let eq = hist.estimate_selectivity(Op::Equals, 50);
    assert!((eq - 0.01).abs() < 0.005, "eq {}", eq);

    let gt = hist.estimate_selectivity(Op::GreaterThan, 50);
    assert!((gt - 0.5).abs() < 0.1, "gt {}", gt);

    assert_eq!(hist.estimate_selectivity(Op::GreaterThan, 100), 0.0);
    assert_eq!(hist.estimate_selectivity(Op::LessThanOrEq, 100), 1.0);
    assert_eq!(hist.estimate_selectivity(Op::Equals, 500), 0.0);
    assert!(hist.estimate_selectivity(Op::GreaterThan, 0) == 1.0);

    // Complements agree.
    let ne = hist.estimate_selectivity(Op::NotEquals, 50);
    assert!((eq + ne - 1.0).abs() < 1e-9);
}

#[test]
fn test_table_stats_estimates() -> Result<()> {
    let db = test_db();
    let table_id = seeded_table(&db, 100)?;

    let stats = TableStats::new(&db, table_id, 1000)?;
    assert_eq!(stats.num_tuples(), 100);

    let pages = db.catalog().table(table_id)?.num_pages()?;
    assert_eq!(stats.estimate_scan_cost(), pages as f64 * 1000.0);
    assert_eq!(stats.estimate_table_cardinality(0.5), 50);

    let sel = stats.estimate_selectivity(0, Op::GreaterThan, &Field::Int(49))?;
    assert!((sel - 0.5).abs() < 0.1, "selectivity {}", sel);
    Ok(())
}
