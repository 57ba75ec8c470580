//! Sequential FIFO, emptiness, and quiescent-length properties against both
//! backends.

use msqueue::{LockFreeQueue, LockedQueue, QueueBackend, QueueError, WorkerHandle};

#[test]
fn lockfree_sequential_fifo() {
    let q = LockFreeQueue::<i64>::new(1).unwrap();
    let mut w = q.register().unwrap();
    for i in 0..10 {
        w.enqueue(i).unwrap();
    }
    assert_eq!(q.len(), 10);

    let mut out = Vec::new();
    while let Ok(v) = w.dequeue() {
        out.push(v);
    }
    assert_eq!(out, (0..10).collect::<Vec<_>>());
    assert_eq!(q.len(), 0);
}

#[test]
fn locked_sequential_fifo() {
    let q = LockedQueue::<i64>::new(1).unwrap();
    let mut w = q.register().unwrap();
    for i in 0..10 {
        w.enqueue(i).unwrap();
    }
    assert_eq!(q.len(), 10);

    let mut out = Vec::new();
    while let Ok(v) = w.dequeue() {
        out.push(v);
    }
    assert_eq!(out, (0..10).collect::<Vec<_>>());
    assert_eq!(q.len(), 0);
}

#[test]
fn lockfree_fresh_queue_is_empty() {
    let q = LockFreeQueue::<i64>::new(1).unwrap();
    let mut w = q.register().unwrap();
    assert_eq!(w.dequeue(), Err(QueueError::Empty));
    assert_eq!(q.len(), 0);
}

#[test]
fn locked_fresh_queue_is_empty() {
    let q = LockedQueue::<i64>::new(1).unwrap();
    let mut w = q.register().unwrap();
    assert_eq!(w.dequeue(), Err(QueueError::Empty));
    assert_eq!(q.len(), 0);
}

#[test]
fn drained_queue_stays_empty_on_further_dequeue() {
    let q = LockFreeQueue::<i64>::new(1).unwrap();
    let mut w = q.register().unwrap();
    w.enqueue(42).unwrap();
    assert_eq!(w.dequeue(), Ok(42));
    for _ in 0..5 {
        assert_eq!(w.dequeue(), Err(QueueError::Empty));
    }
}

#[test]
fn quiescent_length_after_enqueue_and_drain() {
    let q = LockFreeQueue::<i64>::new(1).unwrap();
    let mut w = q.register().unwrap();
    for i in 0..37 {
        w.enqueue(i).unwrap();
    }
    assert_eq!(q.len(), 37);
    for _ in 0..37 {
        w.dequeue().unwrap();
    }
    assert_eq!(q.len(), 0);
}

#[test]
fn interleaved_enqueue_dequeue_preserves_order() {
    let q = LockFreeQueue::<i64>::new(1).unwrap();
    let mut w = q.register().unwrap();
    for i in 0..100 {
        w.enqueue(i).unwrap();
        assert_eq!(w.dequeue(), Ok(i));
    }
    assert_eq!(q.len(), 0);
    assert_eq!(w.dequeue(), Err(QueueError::Empty));
}
