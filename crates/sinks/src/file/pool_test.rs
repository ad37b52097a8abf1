use super::*;
use std::sync::Barrier;
use std::thread;
use tempfile::TempDir;

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

// =============================================================================
// FileWriter
// =============================================================================

#[test]
fn test_writer_creates_parent_dirs() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("a/b/c/out.log");

    let writer = FileWriter::open(&path).unwrap();
    writer.append(b"hello\n").unwrap();

    assert_eq!(read(&path), "hello\n");
    assert_eq!(writer.bytes_written(), 6);
    assert_eq!(writer.path(), path.as_path());
}

#[test]
fn test_writer_appends_to_existing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out.log");
    fs::write(&path, "existing\n").unwrap();

    let writer = FileWriter::open(&path).unwrap();
    writer.append(b"more\n").unwrap();

    assert_eq!(read(&path), "existing\nmore\n");
}

#[test]
fn test_writer_append_after_close_fails() {
    let dir = TempDir::new().unwrap();
    let writer = FileWriter::open(&dir.path().join("x.log")).unwrap();

    writer.close().unwrap();
    assert!(writer.is_closed());
    assert!(writer.append(b"late\n").is_err());

    // second close is a no-op
    writer.close().unwrap();
}

// =============================================================================
// WriterPool: lookup and capacity
// =============================================================================

#[test]
fn test_pool_capacity_minimum_one() {
    assert_eq!(WriterPool::new(0).capacity(), 1);
    assert_eq!(WriterPool::new(5).capacity(), 5);
}

#[test]
fn test_pool_reuses_handle_for_same_path() {
    let dir = TempDir::new().unwrap();
    let pool = WriterPool::new(4);
    let path = dir.path().join("same.log");

    let first = pool.get(&path).unwrap();
    let second = pool.get(&path).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(pool.len(), 1);

    let metrics = pool.metrics().snapshot();
    assert_eq!(metrics.opens, 1);
    assert_eq!(metrics.hits, 1);
}

#[test]
fn test_pool_never_exceeds_capacity() {
    let dir = TempDir::new().unwrap();
    let pool = WriterPool::new(3);

    for i in 0..20 {
        pool.write(&dir.path().join(format!("{i}.log")), b"x\n").unwrap();
        assert!(pool.len() <= 3);
    }

    assert_eq!(pool.len(), 3);
    let metrics = pool.metrics().snapshot();
    assert_eq!(metrics.opens, 20);
    assert_eq!(metrics.evictions, 17);
}

#[test]
fn test_pool_evicts_least_recently_used() {
    let dir = TempDir::new().unwrap();
    let pool = WriterPool::new(2);
    let p1 = dir.path().join("p1.log");
    let p2 = dir.path().join("p2.log");
    let p3 = dir.path().join("p3.log");

    pool.write(&p1, b"1\n").unwrap();
    pool.write(&p2, b"2\n").unwrap();
    // p1 becomes the most recently used
    pool.write(&p1, b"1\n").unwrap();

    pool.write(&p3, b"3\n").unwrap();

    assert!(pool.contains(&p1));
    assert!(!pool.contains(&p2));
    assert!(pool.contains(&p3));
    assert_eq!(pool.paths_by_recency(), vec![p1.clone(), p3.clone()]);
    assert_eq!(pool.metrics().snapshot().evictions, 1);
}

#[test]
fn test_pool_evicts_oldest_without_reuse() {
    let dir = TempDir::new().unwrap();
    let pool = WriterPool::new(2);
    let p1 = dir.path().join("p1.log");
    let p2 = dir.path().join("p2.log");
    let p3 = dir.path().join("p3.log");

    pool.write(&p1, b"a\n").unwrap();
    pool.write(&p2, b"b\n").unwrap();
    pool.write(&p3, b"c\n").unwrap();

    assert!(!pool.contains(&p1));
    assert!(pool.contains(&p2));
    assert!(pool.contains(&p3));
}

#[test]
fn test_reopened_path_appends_not_truncates() {
    let dir = TempDir::new().unwrap();
    let pool = WriterPool::new(1);
    let p1 = dir.path().join("p1.log");
    let p2 = dir.path().join("p2.log");

    pool.write(&p1, b"first\n").unwrap();
    pool.write(&p2, b"other\n").unwrap();
    assert!(!pool.contains(&p1));

    pool.write(&p1, b"second\n").unwrap();
    pool.close_all().unwrap();

    assert_eq!(read(&p1), "first\nsecond\n");
    assert_eq!(read(&p2), "other\n");
}

#[test]
fn test_evicted_handle_still_usable_by_holder() {
    let dir = TempDir::new().unwrap();
    let pool = WriterPool::new(1);
    let p1 = dir.path().join("p1.log");
    let p2 = dir.path().join("p2.log");

    let held = pool.get(&p1).unwrap();
    pool.write(&p2, b"evicts p1\n").unwrap();
    assert!(!pool.contains(&p1));

    // the holder finishes its write on the handle it already has
    held.append(b"in flight\n").unwrap();
    drop(held);

    assert_eq!(read(&p1), "in flight\n");
}

#[test]
fn test_open_failure_is_io_error() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "a file, not a directory").unwrap();

    let pool = WriterPool::new(2);
    let err = pool.write(&blocker.join("child.log"), b"x").unwrap_err();

    assert!(matches!(err, SinkError::Io { ref path, .. } if path.ends_with("child.log")));
    assert!(pool.is_empty());
}

// =============================================================================
// WriterPool: shutdown
// =============================================================================

#[test]
fn test_close_all_clears_and_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let pool = WriterPool::new(4);

    let held = pool.get(&dir.path().join("a.log")).unwrap();
    pool.write(&dir.path().join("b.log"), b"b\n").unwrap();

    pool.close_all().unwrap();
    assert!(pool.is_empty());
    assert!(pool.paths_by_recency().is_empty());
    assert!(held.is_closed());
    assert_eq!(pool.metrics().snapshot().closes, 2);

    pool.close_all().unwrap();
    assert_eq!(pool.metrics().snapshot().closes, 2);
}

// =============================================================================
// WriterPool: concurrency
// =============================================================================

#[test]
fn test_concurrent_writes_same_path_do_not_interleave() {
    let dir = TempDir::new().unwrap();
    let pool = WriterPool::new(2);
    let path = dir.path().join("shared.log");
    let line = "x".repeat(4096);

    thread::scope(|s| {
        for t in 0..8 {
            let pool = &pool;
            let path = &path;
            let payload = format!("{t}{line}\n");
            s.spawn(move || {
                for _ in 0..50 {
                    pool.write(path, payload.as_bytes()).unwrap();
                }
            });
        }
    });
    pool.close_all().unwrap();

    let content = read(&path);
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 8 * 50);
    for l in lines {
        assert_eq!(l.len(), 4097);
        assert!(l[1..].bytes().all(|b| b == b'x'));
    }
}

#[test]
fn test_concurrent_writes_many_paths_under_pressure() {
    // Appends are plain blocking writes with no timeout; every call returns.
    let dir = TempDir::new().unwrap();
    let pool = WriterPool::new(2);

    thread::scope(|s| {
        for t in 0..6 {
            let pool = &pool;
            let root = dir.path();
            s.spawn(move || {
                for i in 0..100 {
                    let path = root.join(format!("{}.log", (t + i) % 5));
                    pool.write(&path, b"line\n").unwrap();
                    assert!(pool.len() <= 2);
                }
            });
        }
    });
    pool.close_all().unwrap();

    let total: usize = (0..5)
        .map(|i| read(&dir.path().join(format!("{i}.log"))).lines().count())
        .sum();
    assert_eq!(total, 600);
}

#[test]
fn test_racing_first_opens_share_one_writer() {
    let dir = TempDir::new().unwrap();
    let pool = WriterPool::new(4);
    let path = dir.path().join("race.log");
    let barrier = Barrier::new(8);

    let writers: Vec<Arc<FileWriter>> = thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let (pool, path, barrier) = (&pool, &path, &barrier);
                s.spawn(move || {
                    barrier.wait();
                    pool.get(path).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(writers.iter().all(|w| Arc::ptr_eq(w, &writers[0])));
    assert_eq!(pool.len(), 1);
    let metrics = pool.metrics().snapshot();
    assert_eq!(metrics.opens, 1);
    assert_eq!(metrics.hits, 7);
}
