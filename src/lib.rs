//! A multi-producer/multi-consumer unbounded FIFO queue with two
//! interchangeable backends behind one [`QueueBackend`] contract:
//!
//! - [`lockfree::LockFreeQueue`], a Michael-Scott queue with ABA-protecting
//!   stamped pointers and per-thread node recycling.
//! - [`locked::LockedQueue`], a single-mutex reference implementation used
//!   as a conformance oracle and performance baseline.
//!
//! ```
//! use msqueue::{LockFreeQueue, QueueBackend, WorkerHandle};
//!
//! let q = LockFreeQueue::<i32>::new(1).unwrap();
//! let mut worker = q.register().unwrap();
//! for i in 0..10 {
//!     worker.enqueue(i).unwrap();
//! }
//! assert_eq!(q.len(), 10);
//!
//! let mut drained = Vec::new();
//! while let Ok(v) = worker.dequeue() {
//!     drained.push(v);
//! }
//! assert_eq!(drained, (0..10).collect::<Vec<_>>());
//! assert_eq!(q.len(), 0);
//! ```

pub mod cli;
pub mod error;
pub mod freelist;
pub mod harness;
pub mod locked;
pub mod lockfree;
pub mod node;
pub mod stamped;
pub mod stats;
pub mod worker;

pub use error::QueueError;
pub use locked::LockedQueue;
pub use lockfree::LockFreeQueue;
pub use stats::Stats;

/// One contract shared by both queue backends.
pub trait QueueBackend<T> {
    type Worker<'q>: WorkerHandle<T> + Send
    where
        Self: 'q;

    /// Claims the next free slot in this queue's per-thread freelist array.
    /// Returns [`QueueError::NoMem`] once every slot the queue was sized
    /// for at construction has been claimed.
    fn register(&self) -> Result<Self::Worker<'_>, QueueError>;

    /// Lower-bound, non-linearizable count of live elements. Meaningful
    /// only when no other operation is concurrently in flight.
    fn len(&self) -> usize;
}

/// Per-worker operations, borrowed from a registered [`QueueBackend`] slot.
pub trait WorkerHandle<T> {
    fn enqueue(&mut self, v: T) -> Result<(), QueueError>;
    fn enqueue_stats(&mut self, v: T, s: &mut Stats) -> Result<(), QueueError>;
    fn dequeue(&mut self) -> Result<T, QueueError>;
    fn dequeue_stats(&mut self, s: &mut Stats) -> Result<T, QueueError>;
}
