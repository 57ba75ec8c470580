//! Benchmark/correctness CLI entry point.
//!
//! Mirrors the original `bench.c`'s `main`: print an INFO banner, then
//! either run the correctness harness or repeat the requested experiment
//! `-r` times, aborting the repetition loop on the first failed run.

use anyhow::{bail, Context, Result};
use clap::Parser;
use msqueue::cli::{BatchConfig, Config, RawArgs};
use msqueue::harness::{check_correctness, experiment_equal, experiment_unequal};
use msqueue::stats::Stats;
use msqueue::LockFreeQueue;

fn print_team_stats(per_worker: &[Stats]) {
    for (id, s) in per_worker.iter().enumerate() {
        println!("Thread: {id} {s}");
    }
    println!();
    println!("Summary {}", Stats::combine(per_worker));
}

fn run_once(cfg: &Config) -> Result<()> {
    let queue: LockFreeQueue<i64> =
        LockFreeQueue::new(cfg.threads).context("allocating queue")?;

    let per_worker = match &cfg.batches {
        BatchConfig::Equal { enqueue, dequeue } => {
            experiment_equal(&queue, cfg.threads, cfg.duration, *enqueue, *dequeue)
        }
        BatchConfig::Unequal { enqueue, dequeue } => {
            experiment_unequal(&queue, cfg.threads, cfg.duration, enqueue, dequeue)
        }
    };

    print_team_stats(&per_worker);
    Ok(())
}

fn run_correctness(cfg: &Config) -> Result<()> {
    log::info!("Checking for correctness. Ignoring all flags except -n and -t");
    let queue: LockFreeQueue<i64> =
        LockFreeQueue::new(cfg.threads).context("allocating queue")?;
    let result = check_correctness(&queue, cfg.threads, cfg.duration);

    println!();
    println!("Detailed output:");
    println!("thread: enqued ?= dequed");
    for id in 0..cfg.threads {
        let e = result.enqueued[id];
        let d = result.dequeued[id];
        if e == d {
            println!("{id}: {e} == {d}");
        } else {
            println!("{id}: {e} != {d}  x");
        }
    }

    if result.passed() {
        println!("Correctness check passed");
        Ok(())
    } else {
        println!("Correctness check not passed");
        bail!("correctness check failed");
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let raw = RawArgs::parse();
    let cfg = Config::from_raw(raw)?;

    log::info!("Threads:     {}", cfg.threads);
    log::info!("Duration:    {}", cfg.duration.as_secs());

    if cfg.correctness {
        return run_correctness(&cfg);
    }

    log::info!("Repetitions: {}", cfg.repetitions);
    for r in 0..cfg.repetitions {
        if r > 0 {
            println!();
        }
        run_once(&cfg)?;
    }
    Ok(())
}
