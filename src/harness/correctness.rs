//! Two-phase correctness harness.
//!
//! Phase 1: worker `id` enqueues values of the form `i * N + id` for a
//! bounded wall-clock duration and records its own count. Phase 2: every
//! worker drains the queue concurrently until `Empty`, attributing each
//! dequeued value `v` to origin worker `v % N` in a thread-local tally;
//! tallies are merged under a single mutex (the harness's own "critical
//! section", distinct from anything inside the queue).
//!
//! Workers register exactly once, before phase 1, and the same handle is
//! reused in phase 2. Registering per phase would exhaust a queue sized to
//! exactly `threads` slots on the second phase.

use crate::error::QueueError;
use crate::{QueueBackend, WorkerHandle};
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct CorrectnessResult {
    pub enqueued: Vec<usize>,
    pub dequeued: Vec<usize>,
}

impl CorrectnessResult {
    pub fn passed(&self) -> bool {
        self.enqueued == self.dequeued
    }
}

pub fn check_correctness<Q>(q: &Q, threads: usize, duration: Duration) -> CorrectnessResult
where
    Q: QueueBackend<i64> + Sync,
{
    let phase_duration = duration / 2;
    let mut workers: Vec<Q::Worker<'_>> = (0..threads)
        .map(|_| q.register().expect("thread team fits max_threads"))
        .collect();

    let enqueued = Mutex::new(vec![0usize; threads]);
    crossbeam::thread::scope(|scope| {
        for (id, worker) in workers.iter_mut().enumerate() {
            let enqueued = &enqueued;
            scope.spawn(move |_| {
                let start = Instant::now();
                let mut i: usize = 0;
                while start.elapsed() < phase_duration {
                    let value = (i * threads + id) as i64;
                    if worker.enqueue(value).is_ok() {
                        i += 1;
                    }
                }
                enqueued.lock().expect("lock poisoned")[id] = i;
            });
        }
    })
    .expect("phase 1 worker panicked");

    let dequeued = Mutex::new(vec![0usize; threads]);
    crossbeam::thread::scope(|scope| {
        for worker in workers.iter_mut() {
            let dequeued = &dequeued;
            scope.spawn(move |_| {
                let mut local = vec![0usize; threads];
                loop {
                    match worker.dequeue() {
                        Ok(v) => local[(v as usize) % threads] += 1,
                        Err(QueueError::NoMem) => unreachable!("dequeue never returns NoMem"),
                        Err(QueueError::Empty) => break,
                    }
                }
                let mut totals = dequeued.lock().expect("lock poisoned");
                for (slot, count) in totals.iter_mut().zip(local.into_iter()) {
                    *slot += count;
                }
            });
        }
    })
    .expect("phase 2 worker panicked");

    CorrectnessResult {
        enqueued: enqueued.into_inner().expect("lock poisoned"),
        dequeued: dequeued.into_inner().expect("lock poisoned"),
    }
}
