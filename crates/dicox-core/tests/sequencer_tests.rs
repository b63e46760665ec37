//! Sequencer integration tests: uniqueness under concurrency and
//! durability across restarts.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::thread;

use dicox_core::Database;

#[test]
fn test_concurrent_next_yields_dense_unique_range() {
    let db = Arc::new(Mutex::new(Database::open_in_memory().unwrap()));

    const THREADS: usize = 8;
    const PER_THREAD: usize = 25;

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let db = Arc::clone(&db);
            thread::spawn(move || {
                let mut issued = Vec::with_capacity(PER_THREAD);
                for _ in 0..PER_THREAD {
                    let value = db.lock().unwrap().next_receipt().unwrap();
                    issued.push(value);
                }
                issued
            })
        })
        .collect();

    let mut all = Vec::new();
    for handle in handles {
        all.extend(handle.join().unwrap());
    }

    let expected: HashSet<u64> = (1..=(THREADS * PER_THREAD) as u64).collect();
    let actual: HashSet<u64> = all.iter().copied().collect();
    assert_eq!(all.len(), THREADS * PER_THREAD);
    assert_eq!(actual, expected, "no duplicates, no gaps");
}

#[test]
fn test_contending_connections_never_share_a_value() {
    // Independent connections on the same file take the write lock in turn;
    // the busy retry path absorbs the contention.
    let file = tempfile::NamedTempFile::new().unwrap();
    let path = file.path().to_path_buf();

    // First open creates the schema before the threads race.
    drop(Database::open(&path).unwrap());

    const THREADS: usize = 4;
    const PER_THREAD: usize = 5;

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let path = path.clone();
            thread::spawn(move || {
                let mut db = Database::open(&path).unwrap();
                let mut issued = Vec::with_capacity(PER_THREAD);
                for _ in 0..PER_THREAD {
                    issued.push(db.next_receipt().unwrap());
                }
                issued
            })
        })
        .collect();

    let mut all = Vec::new();
    for handle in handles {
        all.extend(handle.join().unwrap());
    }

    let expected: HashSet<u64> = (1..=(THREADS * PER_THREAD) as u64).collect();
    let actual: HashSet<u64> = all.iter().copied().collect();
    assert_eq!(all.len(), THREADS * PER_THREAD);
    assert_eq!(actual, expected);
}

#[test]
fn test_counter_survives_restart() {
    let file = tempfile::NamedTempFile::new().unwrap();

    {
        let mut db = Database::open(file.path()).unwrap();
        assert_eq!(db.next_receipt().unwrap(), 1);
        assert_eq!(db.next_receipt().unwrap(), 2);
        assert_eq!(db.next_receipt().unwrap(), 3);
    }

    // Fresh connection, same backing store: the sequence continues.
    let mut db = Database::open(file.path()).unwrap();
    assert_eq!(db.peek_receipt().unwrap(), 4);
    assert_eq!(db.next_receipt().unwrap(), 4);
}
