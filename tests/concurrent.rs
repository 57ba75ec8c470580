//! Conservation under concurrency, and the permutation of enqueue/dequeue
//! orderings the original `test_conc` exercised, expressed as discrete
//! `#[test]` functions.

use msqueue::{LockFreeQueue, QueueBackend, QueueError, WorkerHandle};
use std::time::Duration;

const N: i64 = 20_000;

fn parallel_enqueue(q: &LockFreeQueue<i64>, threads: usize) {
    crossbeam::thread::scope(|scope| {
        let per_thread = N / threads as i64;
        for t in 0..threads as i64 {
            scope.spawn(move |_| {
                let mut w = q.register().unwrap();
                let start = t * per_thread;
                let end = if t == threads as i64 - 1 {
                    N
                } else {
                    start + per_thread
                };
                for i in start..end {
                    w.enqueue(i).unwrap();
                }
            });
        }
    })
    .unwrap();
}

#[test]
fn parallel_enqueue_then_sequential_drain() {
    let q = LockFreeQueue::<i64>::new(9).unwrap();
    parallel_enqueue(&q, 8);
    assert_eq!(q.len(), N as usize);

    let mut w = q.register().unwrap();
    let mut seen = vec![0u32; N as usize];
    while let Ok(v) = w.dequeue() {
        seen[v as usize] += 1;
    }
    assert!(seen.iter().all(|&c| c == 1), "every value dequeued exactly once");
    assert_eq!(q.len(), 0);
}

#[test]
fn sequential_enqueue_then_parallel_drain_conserves_multiset() {
    let q = LockFreeQueue::<i64>::new(9).unwrap();
    {
        let mut w = q.register().unwrap();
        for i in 0..N {
            w.enqueue(i).unwrap();
        }
    }

    let counts: Vec<Vec<u32>> = crossbeam::thread::scope(|scope| {
        (0..8)
            .map(|_| {
                scope.spawn(|_| {
                    let mut w = q.register().unwrap();
                    let mut local = vec![0u32; N as usize];
                    while let Ok(v) = w.dequeue() {
                        local[v as usize] += 1;
                    }
                    local
                })
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect()
    })
    .unwrap();

    let mut total = vec![0u32; N as usize];
    for local in counts {
        for (slot, c) in total.iter_mut().zip(local) {
            *slot += c;
        }
    }
    assert!(total.iter().all(|&c| c == 1));
    assert_eq!(q.len(), 0);
}

#[test]
fn mixed_concurrent_enqueue_dequeue_terminates_without_deadlock() {
    // No deadlock or livelock over a bounded observation window.
    let q = LockFreeQueue::<i64>::new(17).unwrap();
    crossbeam::thread::scope(|scope| {
        for t in 0..16i64 {
            let q = &q;
            scope.spawn(move |_| {
                let mut w = q.register().unwrap();
                let start = std::time::Instant::now();
                let mut i = 0i64;
                while start.elapsed() < Duration::from_millis(300) {
                    w.enqueue(t * 1_000_000 + i).unwrap();
                    i += 1;
                    let _ = w.dequeue();
                }
            });
        }
    })
    .unwrap();
    // Reaching here at all demonstrates the bounded window completed.
    let mut w = q.register().unwrap();
    let mut drained = 0usize;
    while w.dequeue().is_ok() {
        drained += 1;
    }
    assert_eq!(q.len(), 0);
    let _ = drained;
}

#[test]
fn no_spurious_values_survive_a_churn_cycle() {
    let q = LockFreeQueue::<i64>::new(5).unwrap();
    parallel_enqueue(&q, 4);
    let mut w = q.register().unwrap();
    while let Ok(v) = w.dequeue() {
        assert!((0..N).contains(&v), "dequeued value {v} was never enqueued");
    }
}

#[test]
fn empty_dequeue_after_parallel_drain_stays_empty() {
    let q = LockFreeQueue::<i64>::new(9).unwrap();
    parallel_enqueue(&q, 4);
    crossbeam::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|_| {
                let mut w = q.register().unwrap();
                while w.dequeue().is_ok() {}
            });
        }
    })
    .unwrap();

    let mut w = q.register().unwrap();
    for _ in 0..10 {
        assert_eq!(w.dequeue(), Err(QueueError::Empty));
    }
    assert_eq!(q.len(), 0);
}
