//! Lock-free Michael-Scott queue: enqueue links at the tail, dequeue
//! advances past the head sentinel.
//!
//! `enqueue`'s linearization point is the CAS that links the new node onto
//! the previous tail; `dequeue`'s is the CAS that advances `head` past the
//! node being returned. Both loops help advance a lagging `tail` on behalf
//! of a stalled enqueuer before making further progress, which is what
//! keeps the queue lock-free rather than merely obstruction-free.
//!
//! `T: Clone` is required so a dequeuer can read a node's value *before*
//! attempting the head CAS: reading it after would race a recycling
//! enqueuer that reuses the same node through the freelist. Contending
//! dequeuers that lose the CAS simply drop their speculative clone; the
//! winner's clone is the one actually returned.

use crate::error::QueueError;
use crate::freelist::Freelist;
use crate::node::{self, Node};
use crate::stats::Stats;
use crate::worker::WorkerRegistry;
use crate::{QueueBackend, WorkerHandle};
use crossbeam_utils::{Backoff, CachePadded};
use std::sync::atomic::Ordering;

/// Reborrows an `Option<&mut Stats>` with a shorter lifetime so the same
/// optional counter set can be threaded through several call sites in one
/// retry loop without being consumed by the first one.
fn reborrow<'a>(stats: &'a mut Option<&mut Stats>) -> Option<&'a mut Stats> {
    match stats {
        Some(s) => Some(&mut **s),
        None => None,
    }
}

pub struct LockFreeQueue<T> {
    head: CachePadded<crate::stamped::StampedPtr<Node<T>>>,
    tail: CachePadded<crate::stamped::StampedPtr<Node<T>>>,
    freelists: Vec<Freelist<T>>,
    registry: WorkerRegistry,
}

unsafe impl<T: Send> Send for LockFreeQueue<T> {}
unsafe impl<T: Send> Sync for LockFreeQueue<T> {}

impl<T: Clone + Send> LockFreeQueue<T> {
    /// Folds the original `create()` + `init()` two-phase construction into
    /// one fallible constructor.
    pub fn new(max_threads: usize) -> Result<Self, QueueError> {
        let sentinel = node::into_raw(Node::sentinel());
        let freelists = (0..max_threads).map(|_| Freelist::default()).collect();
        Ok(LockFreeQueue {
            head: CachePadded::new(crate::stamped::StampedPtr::new(sentinel, 0)),
            tail: CachePadded::new(crate::stamped::StampedPtr::new(sentinel, 0)),
            freelists,
            registry: WorkerRegistry::new(max_threads),
        })
    }

    /// Lower-bound, non-linearizable length: walks the live chain with no
    /// synchronization against concurrent mutation. Defined only for
    /// post-quiescence tests.
    pub fn len(&self) -> usize {
        let (mut n, _) = self.head.load(Ordering::Acquire);
        let mut count = 0usize;
        loop {
            let next = unsafe { node::next_of(n, Ordering::Acquire).0 };
            if next.is_null() {
                break;
            }
            count += 1;
            n = next;
        }
        count
    }

    fn obtain_node(&self, worker: usize, v: T, stats: Option<&mut Stats>) -> *mut Node<T> {
        if let Some(ptr) = self.freelists[worker].pop() {
            if let Some(s) = stats {
                s.record_freelist_pop();
            }
            unsafe {
                (*ptr).value = Some(v);
                (*ptr).next.store(std::ptr::null_mut(), 0, Ordering::Release);
            }
            ptr
        } else {
            node::into_raw(Node::with_value(v))
        }
    }

    fn enqueue_impl(&self, worker: usize, v: T, mut stats: Option<&mut Stats>) -> Result<(), QueueError> {
        let new_node = self.obtain_node(worker, v, reborrow(&mut stats));
        let backoff = Backoff::new();

        loop {
            let (t, t_stamp) = self.tail.load(Ordering::Acquire);
            let (n, n_stamp) = unsafe { node::next_of(t, Ordering::Acquire) };
            let (t2, t2_stamp) = self.tail.load(Ordering::Acquire);
            if t2 != t || t2_stamp != t_stamp {
                backoff.spin();
                continue;
            }

            if n.is_null() {
                let linked = unsafe {
                    (*t).next.compare_exchange_weak(
                        n,
                        n_stamp,
                        new_node,
                        n_stamp.wrapping_add(1),
                        Ordering::AcqRel,
                        Ordering::Acquire,
                    )
                };
                match linked {
                    Ok(()) => {
                        if let Some(s) = reborrow(&mut stats) {
                            s.cas_succ += 1;
                        }
                        // Benign on failure: a later operation will help.
                        let advanced = self.tail.compare_exchange_weak(
                            t,
                            t_stamp,
                            new_node,
                            t_stamp.wrapping_add(1),
                            Ordering::AcqRel,
                            Ordering::Acquire,
                        );
                        if let Some(s) = reborrow(&mut stats) {
                            match advanced {
                                Ok(()) => s.cas_succ += 1,
                                Err(_) => s.cas_fail += 1,
                            }
                        }
                        return Ok(());
                    }
                    Err(_) => {
                        if let Some(s) = reborrow(&mut stats) {
                            s.cas_fail += 1;
                        }
                        backoff.spin();
                    }
                }
            } else {
                let helped = self.tail.compare_exchange_weak(
                    t,
                    t_stamp,
                    n,
                    t_stamp.wrapping_add(1),
                    Ordering::AcqRel,
                    Ordering::Acquire,
                );
                if let Some(s) = reborrow(&mut stats) {
                    match helped {
                        Ok(()) => s.cas_succ += 1,
                        Err(_) => s.cas_fail += 1,
                    }
                }
                backoff.spin();
            }
        }
    }

    fn dequeue_impl(&self, worker: usize, mut stats: Option<&mut Stats>) -> Result<T, QueueError> {
        let backoff = Backoff::new();
        loop {
            let (h, h_stamp) = self.head.load(Ordering::Acquire);
            let (t, t_stamp) = self.tail.load(Ordering::Acquire);
            let (n, n_stamp) = unsafe { node::next_of(h, Ordering::Acquire) };

            let (h2, h2_stamp) = self.head.load(Ordering::Acquire);
            if h2 != h || h2_stamp != h_stamp {
                backoff.spin();
                continue;
            }
            let (t2, t2_stamp) = self.tail.load(Ordering::Acquire);
            if t2 != t || t2_stamp != t_stamp {
                backoff.spin();
                continue;
            }

            if h == t {
                if n.is_null() {
                    return Err(QueueError::Empty);
                }
                let helped = self.tail.compare_exchange_weak(
                    t,
                    t_stamp,
                    n,
                    t_stamp.wrapping_add(1),
                    Ordering::AcqRel,
                    Ordering::Acquire,
                );
                if let Some(s) = reborrow(&mut stats) {
                    match helped {
                        Ok(()) => s.cas_succ += 1,
                        Err(_) => s.cas_fail += 1,
                    }
                }
                backoff.spin();
                continue;
            }

            if n.is_null() {
                // Head and tail disagree but the link hasn't landed yet.
                backoff.spin();
                continue;
            }

            // Read the value before the head CAS: after the CAS, `h`
            // becomes freelist-recyclable and `n` becomes the new
            // sentinel, but the *value* we want lives in `n`, which stays
            // live and unmutated by this operation either way.
            let value = unsafe { (*n).value.clone() }.expect("live node must carry a value");

            let advanced = self.head.compare_exchange_weak(
                h,
                h_stamp,
                n,
                h_stamp.wrapping_add(1),
                Ordering::AcqRel,
                Ordering::Acquire,
            );
            match advanced {
                Ok(()) => {
                    if let Some(s) = reborrow(&mut stats) {
                        s.cas_succ += 1;
                    }
                    unsafe {
                        (*h).value = None;
                        self.freelists[worker].push(h);
                    }
                    if let Some(s) = reborrow(&mut stats) {
                        s.record_freelist_push();
                    }
                    return Ok(value);
                }
                Err(_) => {
                    if let Some(s) = reborrow(&mut stats) {
                        s.cas_fail += 1;
                    }
                    backoff.spin();
                }
            }
        }
    }
}

impl<T> Drop for LockFreeQueue<T> {
    fn drop(&mut self) {
        let (mut n, _) = self.head.load(Ordering::Relaxed);
        while !n.is_null() {
            let next = unsafe { node::next_of(n, Ordering::Relaxed).0 };
            unsafe { drop(node::from_raw(n)) };
            n = next;
        }
        for fl in &self.freelists {
            fl.drain(|ptr| unsafe { drop(node::from_raw(ptr)) });
        }
    }
}

impl<T: Clone + Send> QueueBackend<T> for LockFreeQueue<T> {
    type Worker<'q> = LockFreeWorker<'q, T> where Self: 'q;

    fn register(&self) -> Result<Self::Worker<'_>, QueueError> {
        let id = self.registry.register()?;
        Ok(LockFreeWorker { queue: self, id })
    }

    fn len(&self) -> usize {
        LockFreeQueue::len(self)
    }
}

pub struct LockFreeWorker<'q, T> {
    queue: &'q LockFreeQueue<T>,
    id: usize,
}

impl<'q, T: Clone + Send> WorkerHandle<T> for LockFreeWorker<'q, T> {
    fn enqueue(&mut self, v: T) -> Result<(), QueueError> {
        self.queue.enqueue_impl(self.id, v, None)
    }

    fn enqueue_stats(&mut self, v: T, s: &mut Stats) -> Result<(), QueueError> {
        self.queue.enqueue_impl(self.id, v, Some(s))
    }

    fn dequeue(&mut self) -> Result<T, QueueError> {
        self.queue.dequeue_impl(self.id, None)
    }

    fn dequeue_stats(&mut self, s: &mut Stats) -> Result<T, QueueError> {
        self.queue.dequeue_impl(self.id, Some(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_fifo() {
        let q = LockFreeQueue::<i64>::new(1).unwrap();
        let mut w = q.register().unwrap();
        for i in 0..10 {
            w.enqueue(i).unwrap();
        }
        assert_eq!(q.len(), 10);
        for i in 0..10 {
            assert_eq!(w.dequeue().unwrap(), i);
        }
        assert_eq!(q.len(), 0);
    }

    #[test]
    fn fresh_queue_is_empty() {
        let q = LockFreeQueue::<i64>::new(1).unwrap();
        let mut w = q.register().unwrap();
        assert_eq!(w.dequeue(), Err(QueueError::Empty));
    }

    #[test]
    fn registering_beyond_max_threads_fails() {
        let q = LockFreeQueue::<i64>::new(1).unwrap();
        let _first = q.register().unwrap();
        assert_eq!(q.register().err(), Some(QueueError::NoMem));
    }

    #[test]
    fn freelist_recycles_across_enqueue_dequeue_cycles() {
        let q = LockFreeQueue::<i64>::new(1).unwrap();
        let mut w = q.register().unwrap();
        let mut stats = Stats::new();
        for i in 0..100 {
            w.enqueue_stats(i, &mut stats).unwrap();
            assert_eq!(w.dequeue_stats(&mut stats).unwrap(), i);
        }
        assert!(stats.freelist_insert > 0);
        assert!(stats.cas_succ > 0);
    }
}
