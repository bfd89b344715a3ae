use std::sync::Arc;
use std::thread;
use std::time::Duration;

use emberdb::{
    Database, DatabaseConfig, EmberError, Field, FieldType, PageId, Permissions, Result,
    TransactionId, Tuple, TupleDesc,
};

fn test_db(capacity: usize) -> Database {
    Database::new(DatabaseConfig {
        page_size: 4096,
        buffer_pool_capacity: capacity,
        slots_per_page: 8,
    })
}

fn int_table(db: &Database, name: &str, pages: usize) -> Result<u32> {
    let td = TupleDesc::unnamed(vec![FieldType::Int, FieldType::Int]);
    let table_id = db.create_table(name, td)?;
    let file = db.catalog().table(table_id)?;
    for _ in 0..pages {
        file.allocate_page()?;
    }
    Ok(table_id)
}

fn dirty_page(db: &Database, tid: TransactionId, pid: PageId, marker: i64) -> Result<()> {
    let page = db.buffer_pool().get_page(tid, pid, Permissions::ReadWrite)?;
    let mut guard = page.lock();
    guard.insert_tuple(Tuple::new(vec![Field::Int(marker), Field::Int(marker)]))?;
    guard.mark_dirty(Some(tid));
    Ok(())
}

#[test]
fn test_commit_makes_writes_durable() -> Result<()> {
    let db = test_db(10);
    let table_id = int_table(&db, "t", 1)?;
    let pid = PageId::new(table_id, 0);

    let txn = db.begin_transaction();
    dirty_page(&db, txn.id(), pid, 42)?;
    txn.commit(&db)?;

    // Bypass the cache: the table file itself has the tuple.
    let file = db.catalog().table(table_id)?;
    let page = file.read_page(pid)?;
    assert_eq!(page.num_tuples(), 1);
    assert_eq!(page.tuple(0)?.field(0)?, &Field::Int(42));
    Ok(())
}

#[test]
fn test_abort_reverts_to_disk_state() -> Result<()> {
    let db = test_db(10);
    let table_id = int_table(&db, "t", 1)?;
    let pid = PageId::new(table_id, 0);

    let txn = db.begin_transaction();
    dirty_page(&db, txn.id(), pid, 42)?;
    let tid = txn.id();
    txn.abort(&db);

    // The dirtied page left the cache with the abort...
    assert!(!db.buffer_pool().is_cached(pid));
    assert!(!db.buffer_pool().holds_lock(tid, pid));

    // ...so a later read refetches the untouched on-disk page.
    let txn = db.begin_transaction();
    let page = db
        .buffer_pool()
        .get_page(txn.id(), pid, Permissions::ReadOnly)?;
    assert_eq!(page.lock().num_tuples(), 0);
    txn.commit(&db)?;
    Ok(())
}

#[test]
fn test_flush_pages_writes_exactly_the_owners_pages() -> Result<()> {
    let db = test_db(10);
    let table_id = int_table(&db, "t", 3)?;
    let pid_a = PageId::new(table_id, 0);
    let pid_b = PageId::new(table_id, 1);
    let pid_c = PageId::new(table_id, 2);

    let txn1 = db.begin_transaction();
    let txn2 = db.begin_transaction();
    dirty_page(&db, txn1.id(), pid_a, 1)?;
    dirty_page(&db, txn1.id(), pid_b, 2)?;
    dirty_page(&db, txn2.id(), pid_c, 3)?;

    db.buffer_pool().flush_pages(txn1.id())?;

    let file = db.catalog().table(table_id)?;
    // txn1's pages are on disk and clean in cache...
    assert_eq!(file.read_page(pid_a)?.num_tuples(), 1);
    assert_eq!(file.read_page(pid_b)?.num_tuples(), 1);
    let page_a = db
        .buffer_pool()
        .get_page(txn1.id(), pid_a, Permissions::ReadOnly)?;
    assert_eq!(page_a.lock().is_dirty(), None);

    // ...while txn2's page was not touched.
    assert_eq!(file.read_page(pid_c)?.num_tuples(), 0);
    let page_c = db
        .buffer_pool()
        .get_page(txn2.id(), pid_c, Permissions::ReadOnly)?;
    assert_eq!(page_c.lock().is_dirty(), Some(txn2.id()));

    txn1.commit(&db)?;
    txn2.commit(&db)?;
    Ok(())
}

#[test]
fn test_commit_releases_all_locks() -> Result<()> {
    let db = test_db(10);
    let table_id = int_table(&db, "t", 2)?;
    let pid_a = PageId::new(table_id, 0);
    let pid_b = PageId::new(table_id, 1);

    let txn1 = db.begin_transaction();
    let tid1 = txn1.id();
    db.buffer_pool().get_page(tid1, pid_a, Permissions::ReadWrite)?;
    db.buffer_pool().get_page(tid1, pid_b, Permissions::ReadOnly)?;
    txn1.commit(&db)?;

    assert!(!db.buffer_pool().holds_lock(tid1, pid_a));
    assert!(!db.buffer_pool().holds_lock(tid1, pid_b));

    // Another transaction can take both pages exclusively right away.
    let txn2 = db.begin_transaction();
    db.buffer_pool()
        .get_page(txn2.id(), pid_a, Permissions::ReadWrite)?;
    db.buffer_pool()
        .get_page(txn2.id(), pid_b, Permissions::ReadWrite)?;
    txn2.commit(&db)?;
    Ok(())
}

#[test]
fn test_deadlock_aborts_exactly_one_transaction() -> Result<()> {
    let db = Arc::new(test_db(10));
    let table_id = int_table(&db, "t", 2)?;
    let pid_a = PageId::new(table_id, 0);
    let pid_b = PageId::new(table_id, 1);

    let txn1 = db.begin_transaction();
    let txn2 = db.begin_transaction();
    db.buffer_pool()
        .get_page(txn1.id(), pid_a, Permissions::ReadWrite)?;
    db.buffer_pool()
        .get_page(txn2.id(), pid_b, Permissions::ReadWrite)?;

    let db2 = Arc::clone(&db);
    let worker = thread::spawn(move || {
        let result = db2
            .buffer_pool()
            .get_page(txn2.id(), pid_a, Permissions::ReadWrite);
        let aborted = matches!(result, Err(EmberError::Deadlock(_)));
        if aborted {
            txn2.abort(&db2);
        } else {
            result.unwrap();
            txn2.commit(&db2).unwrap();
        }
        aborted
    });

    thread::sleep(Duration::from_millis(150));
    let result = db
        .buffer_pool()
        .get_page(txn1.id(), pid_b, Permissions::ReadWrite);
    let t1_aborted = matches!(result, Err(EmberError::Deadlock(_)));
    if t1_aborted {
        txn1.abort(&db);
    } else {
        result?;
        txn1.commit(&db)?;
    }
    let t2_aborted = worker.join().unwrap();

    assert!(
        t1_aborted ^ t2_aborted,
        "expected exactly one deadlock abort, got t1={} t2={}",
        t1_aborted,
        t2_aborted
    );
    Ok(())
}

#[test]
fn test_self_upgrade_is_not_a_deadlock() -> Result<()> {
    let db = Arc::new(test_db(10));
    let table_id = int_table(&db, "t", 2)?;
    let pid_a = PageId::new(table_id, 0);
    let pid_b = PageId::new(table_id, 1);

    // T1 reads both pages.
    let txn1 = db.begin_transaction();
    db.buffer_pool()
        .get_page(txn1.id(), pid_a, Permissions::ReadOnly)?;
    db.buffer_pool()
        .get_page(txn1.id(), pid_b, Permissions::ReadOnly)?;

    // T2 asks for A exclusively and blocks behind T1's shared hold.
    let txn2 = db.begin_transaction();
    let db2 = Arc::clone(&db);
    let worker = thread::spawn(move || {
        db2.buffer_pool()
            .get_page(txn2.id(), pid_a, Permissions::ReadWrite)
            .unwrap();
        txn2.commit(&db2).unwrap();
    });
    thread::sleep(Duration::from_millis(100));

    // T1 is the sole shared holder of both pages: upgrading either one
    // succeeds in place. The waiting T2 holds nothing T1 needs, so no
    // deadlock is reported.
    db.buffer_pool()
        .get_page(txn1.id(), pid_b, Permissions::ReadWrite)?;
    db.buffer_pool()
        .get_page(txn1.id(), pid_a, Permissions::ReadWrite)?;

    // T2 gets A once T1 commits.
    txn1.commit(&db)?;
    worker.join().unwrap();
    Ok(())
}
