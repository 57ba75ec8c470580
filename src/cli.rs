//! Benchmark CLI flags, parsed with `clap` instead of the original's
//! hand-rolled `getopt` loop, plus the same cross-flag validation
//! (`-E`/`-D` required together, mutually exclusive with `-e`/`-d`, vector
//! lengths equal `-n`, `min <= max` for ranges).

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "msqueue-bench",
    about = "Benchmark and correctness harness for the MPMC queue"
)]
pub struct RawArgs {
    /// Worker count (default: available parallelism)
    #[arg(short = 'n')]
    pub threads: Option<usize>,

    /// Duration in seconds
    #[arg(short = 't', default_value_t = 1)]
    pub duration: u64,

    /// Repetition count
    #[arg(short = 'r', default_value_t = 1)]
    pub repetitions: usize,

    /// Correctness mode: ignores batch flags except -n, -t
    #[arg(short = 'c')]
    pub correctness: bool,

    /// Enqueue batch: `k` or `min,max`
    #[arg(short = 'e')]
    pub enqueue_batch: Option<String>,

    /// Dequeue batch: `k` or `min,max`
    #[arg(short = 'd')]
    pub dequeue_batch: Option<String>,

    /// Per-worker fixed enqueue batch vector: `v1,v2,...,vN`
    #[arg(short = 'E')]
    pub enqueue_vector: Option<String>,

    /// Per-worker fixed dequeue batch vector: `v1,v2,...,vN`
    #[arg(short = 'D')]
    pub dequeue_vector: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct BatchRange {
    pub min: usize,
    pub max: usize,
}

impl BatchRange {
    pub fn fixed(k: usize) -> Self {
        BatchRange { min: k, max: k }
    }

    pub fn is_fixed(&self) -> bool {
        self.min == self.max
    }
}

#[derive(Debug, Clone)]
pub enum BatchConfig {
    Equal { enqueue: BatchRange, dequeue: BatchRange },
    Unequal { enqueue: Vec<usize>, dequeue: Vec<usize> },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub threads: usize,
    pub duration: Duration,
    pub repetitions: usize,
    pub correctness: bool,
    pub batches: BatchConfig,
}

const DEFAULT_BATCH: usize = 10;

fn parse_range(s: &str) -> Result<BatchRange> {
    if let Some((a, b)) = s.split_once(',') {
        let min: usize = a.trim().parse().context("invalid batch range minimum")?;
        let max: usize = b.trim().parse().context("invalid batch range maximum")?;
        if min > max {
            bail!("eb_min/db_min ({min}) > eb_max/db_max ({max})");
        }
        Ok(BatchRange { min, max })
    } else {
        let k: usize = s.trim().parse().context("invalid batch size")?;
        Ok(BatchRange::fixed(k))
    }
}

fn parse_vector(s: &str, n: usize) -> Result<Vec<usize>> {
    let values: Result<Vec<usize>> = s
        .split(',')
        .map(|tok| tok.trim().parse::<usize>().context("invalid vector entry"))
        .collect();
    let values = values?;
    if values.len() != n {
        bail!("expected exactly {n} (= -n) values, got {}", values.len());
    }
    Ok(values)
}

impl Config {
    pub fn from_raw(raw: RawArgs) -> Result<Config> {
        let threads = match raw.threads {
            Some(n) => n,
            None => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        };
        if threads == 0 {
            bail!("-n must be a positive worker count");
        }

        let has_vectors = raw.enqueue_vector.is_some() || raw.dequeue_vector.is_some();
        let has_ranges = raw.enqueue_batch.is_some() || raw.dequeue_batch.is_some();

        if has_vectors && (raw.enqueue_vector.is_none() || raw.dequeue_vector.is_none()) {
            bail!("-E and -D flag must both be set or not set");
        }
        if has_vectors && has_ranges {
            bail!("if -E or -D flag is set, -e or -d flag can not be set");
        }

        let batches = if let (Some(e), Some(d)) = (raw.enqueue_vector, raw.dequeue_vector) {
            BatchConfig::Unequal {
                enqueue: parse_vector(&e, threads)?,
                dequeue: parse_vector(&d, threads)?,
            }
        } else {
            let enqueue = match raw.enqueue_batch {
                Some(s) => parse_range(&s)?,
                None => BatchRange::fixed(DEFAULT_BATCH),
            };
            let dequeue = match raw.dequeue_batch {
                Some(s) => parse_range(&s)?,
                None => BatchRange::fixed(DEFAULT_BATCH),
            };
            BatchConfig::Equal { enqueue, dequeue }
        };

        if raw.repetitions == 0 {
            return Err(anyhow!("-r must be a positive repetition count"));
        }

        Ok(Config {
            threads,
            duration: Duration::from_secs(raw.duration),
            repetitions: raw.repetitions,
            correctness: raw.correctness,
            batches,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(args: &[&str]) -> RawArgs {
        let mut full = vec!["msqueue-bench"];
        full.extend_from_slice(args);
        RawArgs::parse_from(full)
    }

    #[test]
    fn defaults_to_10_10_equal_batches() {
        let cfg = Config::from_raw(raw(&["-n", "4"])).unwrap();
        match cfg.batches {
            BatchConfig::Equal { enqueue, dequeue } => {
                assert_eq!(enqueue.min, 10);
                assert_eq!(dequeue.max, 10);
            }
            _ => panic!("expected equal config"),
        }
    }

    #[test]
    fn e_and_d_together_required() {
        let err = Config::from_raw(raw(&["-n", "2", "-E", "1,2"])).unwrap_err();
        assert!(err.to_string().contains("-E and -D"));
    }

    #[test]
    fn vector_length_must_match_n() {
        let err = Config::from_raw(raw(&["-n", "2", "-E", "1,2,3", "-D", "1,2,3"])).unwrap_err();
        assert!(err.to_string().contains("expected exactly 2"));
    }

    #[test]
    fn range_min_must_not_exceed_max() {
        let err = Config::from_raw(raw(&["-n", "1", "-e", "5,1"])).unwrap_err();
        assert!(err.to_string().contains(">"));
    }

    #[test]
    fn vectors_conflict_with_ranges() {
        let err =
            Config::from_raw(raw(&["-n", "2", "-e", "1", "-E", "1,2", "-D", "1,2"])).unwrap_err();
        assert!(err.to_string().contains("can not be set"));
    }
}
