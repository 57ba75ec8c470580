//! Fixed/random batch workers and the equal/unequal experiment drivers.
//! The enqueued value is always the loop index, reused across iterations;
//! its contents are irrelevant to throughput measurement.

use crate::cli::BatchRange;
use crate::stats::Stats;
use crate::{QueueBackend, WorkerHandle};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::{Duration, Instant};

/// Repeatedly enqueues `eb` items then dequeues `db` items until `duration`
/// elapses.
pub fn worker_fixed<W: WorkerHandle<i64>>(
    worker: &mut W,
    stats: &mut Stats,
    duration: Duration,
    eb: usize,
    db: usize,
) {
    let start = Instant::now();
    while start.elapsed() < duration {
        for i in 0..eb {
            match worker.enqueue_stats(i as i64, stats) {
                Ok(()) => stats.enq_succ += 1,
                Err(_) => stats.enq_fail += 1,
            }
        }
        for _ in 0..db {
            match worker.dequeue_stats(stats) {
                Ok(_) => stats.deq_succ += 1,
                Err(_) => stats.deq_fail += 1,
            }
        }
    }
    stats.duration = start.elapsed().as_secs_f64();
}

/// Each iteration draws `eb` and `db` uniformly from their ranges using a
/// thread-local PRNG seeded from the worker id, mirroring the original's
/// `rand_r(&seed)` where `seed = thread_num * 100000`.
pub fn worker_rand<W: WorkerHandle<i64>>(
    worker: &mut W,
    stats: &mut Stats,
    duration: Duration,
    worker_id: usize,
    eb: BatchRange,
    db: BatchRange,
) {
    let start = Instant::now();
    let mut rng = StdRng::seed_from_u64((worker_id as u64) * 100_000);
    while start.elapsed() < duration {
        let batch = rng.gen_range(eb.min..=eb.max);
        for i in 0..batch {
            match worker.enqueue_stats(i as i64, stats) {
                Ok(()) => stats.enq_succ += 1,
                Err(_) => stats.enq_fail += 1,
            }
        }
        let batch = rng.gen_range(db.min..=db.max);
        for _ in 0..batch {
            match worker.dequeue_stats(stats) {
                Ok(_) => stats.deq_succ += 1,
                Err(_) => stats.deq_fail += 1,
            }
        }
    }
    stats.duration = start.elapsed().as_secs_f64();
}

fn run_team<Q, F>(q: &Q, threads: usize, per_worker: F) -> Vec<Stats>
where
    Q: QueueBackend<i64> + Sync,
    F: for<'w> Fn(usize, &mut Q::Worker<'w>, &mut Stats) + Sync,
{
    let mut all_stats = vec![Stats::new(); threads];
    crossbeam::thread::scope(|scope| {
        for (id, slot) in all_stats.iter_mut().enumerate() {
            let per_worker = &per_worker;
            scope.spawn(move |_| {
                let mut worker = q
                    .register()
                    .expect("thread team fits the queue's max_threads");
                per_worker(id, &mut worker, slot);
            });
        }
    })
    .expect("worker thread panicked");
    all_stats
}

/// Runs one "equal" experiment: every worker uses the same batch ranges.
pub fn experiment_equal<Q>(
    q: &Q,
    threads: usize,
    duration: Duration,
    eb: BatchRange,
    db: BatchRange,
) -> Vec<Stats>
where
    Q: QueueBackend<i64> + Sync,
{
    run_team(q, threads, move |id, worker, stats| {
        if eb.is_fixed() && db.is_fixed() {
            worker_fixed(worker, stats, duration, eb.min, db.min);
        } else {
            worker_rand(worker, stats, duration, id, eb, db);
        }
    })
}

/// Runs one "unequal" experiment: an explicit per-worker fixed batch vector.
pub fn experiment_unequal<Q>(
    q: &Q,
    threads: usize,
    duration: Duration,
    ebs: &[usize],
    dbs: &[usize],
) -> Vec<Stats>
where
    Q: QueueBackend<i64> + Sync,
{
    run_team(q, threads, move |id, worker, stats| {
        worker_fixed(worker, stats, duration, ebs[id], dbs[id]);
    })
}
