use env_logger::Builder;
use log::{info, LevelFilter};

use emberdb::query::{AggregateOp, Aggregator, Filter, Op, Predicate, SeqScan};
use emberdb::{Database, DatabaseConfig, Field, FieldType, Tuple, TupleDesc};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    Builder::new().filter_level(LevelFilter::Info).init();

    let db = Database::new(DatabaseConfig::default());

    // Three-column table of integers.
    let descriptor = TupleDesc::new(
        vec![FieldType::Int, FieldType::Int, FieldType::Int],
        vec![
            Some("field0".to_string()),
            Some("field1".to_string()),
            Some("field2".to_string()),
        ],
    );
    let table_id = db.create_table("test", descriptor)?;

    let txn = db.begin_transaction();
    for i in 0..100i64 {
        let tuple = Tuple::new(vec![
            Field::Int(i),
            Field::Int(i % 10),
            Field::Int(i * 2),
        ]);
        db.buffer_pool().insert_tuple(txn.id(), table_id, tuple)?;
    }
    txn.commit(&db)?;
    info!("loaded 100 tuples into table {}", table_id);

    // SELECT * FROM test WHERE field0 > 90
    let txn = db.begin_transaction();
    let scan = SeqScan::with_alias(&db, txn.id(), table_id, "test")?;
    let filter = Filter::new(
        Predicate::new(0, Op::GreaterThan, Field::Int(90)),
        scan,
    );
    for tuple in filter {
        println!("{}", tuple?);
    }

    // SELECT field1, COUNT(*) FROM test GROUP BY field1
    let mut counts = Aggregator::new(Some(1), 0, AggregateOp::Count);
    counts.merge_all(SeqScan::new(&db, txn.id(), table_id)?)?;
    for row in counts.results() {
        println!("{}", row);
    }
    txn.commit(&db)?;

    db.close()?;
    Ok(())
}
