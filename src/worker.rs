//! Worker registration: Rust's stand-in for an OpenMP-style ambient thread id.
//!
//! Rust threads carry no built-in numeric id, so a worker explicitly
//! registers with the queue once and gets back a slot index into the
//! freelist array that the queue sized at construction time.

use crate::error::QueueError;
use std::sync::atomic::{AtomicUsize, Ordering};

pub struct WorkerRegistry {
    max_threads: usize,
    next: AtomicUsize,
}

impl WorkerRegistry {
    pub fn new(max_threads: usize) -> Self {
        WorkerRegistry {
            max_threads,
            next: AtomicUsize::new(0),
        }
    }

    pub fn max_threads(&self) -> usize {
        self.max_threads
    }

    /// Hands out the next free slot index, or `NoMem` once every slot the
    /// queue was sized for has been claimed.
    pub fn register(&self) -> Result<usize, QueueError> {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        if id >= self.max_threads {
            self.next.fetch_sub(1, Ordering::Relaxed);
            return Err(QueueError::NoMem);
        }
        Ok(id)
    }
}
