//! Single-mutex reference queue: the correctness oracle and performance
//! baseline that the lock-free variant is checked against. The external
//! contract is identical; internally everything is serialized, so there is
//! no CAS, no stamped pointer, and no ABA hazard to defend against.

use crate::error::QueueError;
use crate::stats::Stats;
use crate::worker::WorkerRegistry;
use crate::{QueueBackend, WorkerHandle};
use std::ptr;
use std::sync::Mutex;

struct PlainNode<T> {
    value: Option<T>,
    next: *mut PlainNode<T>,
}

struct Inner<T> {
    head: *mut PlainNode<T>,
    tail: *mut PlainNode<T>,
    freelists: Vec<*mut PlainNode<T>>,
}

unsafe impl<T: Send> Send for Inner<T> {}

pub struct LockedQueue<T> {
    inner: Mutex<Inner<T>>,
    registry: WorkerRegistry,
}

unsafe impl<T: Send> Sync for LockedQueue<T> {}

impl<T: Send> LockedQueue<T> {
    pub fn new(max_threads: usize) -> Result<Self, QueueError> {
        let sentinel = Box::into_raw(Box::new(PlainNode {
            value: None,
            next: ptr::null_mut(),
        }));
        Ok(LockedQueue {
            inner: Mutex::new(Inner {
                head: sentinel,
                tail: sentinel,
                freelists: vec![ptr::null_mut(); max_threads],
            }),
            registry: WorkerRegistry::new(max_threads),
        })
    }

    pub fn len(&self) -> usize {
        let inner = self.inner.lock().expect("lock poisoned");
        let mut n = unsafe { (*inner.head).next };
        let mut count = 0usize;
        while !n.is_null() {
            count += 1;
            n = unsafe { (*n).next };
        }
        count
    }

    fn enqueue_impl(&self, worker: usize, v: T, stats: Option<&mut Stats>) -> Result<(), QueueError> {
        let mut inner = self.inner.lock().expect("lock poisoned");
        let node = if !inner.freelists[worker].is_null() {
            let recycled = inner.freelists[worker];
            inner.freelists[worker] = unsafe { (*recycled).next };
            if let Some(s) = stats {
                s.record_freelist_pop();
            }
            unsafe {
                (*recycled).value = Some(v);
                (*recycled).next = ptr::null_mut();
            }
            recycled
        } else {
            Box::into_raw(Box::new(PlainNode {
                value: Some(v),
                next: ptr::null_mut(),
            }))
        };
        unsafe {
            (*inner.tail).next = node;
        }
        inner.tail = node;
        Ok(())
    }

    fn dequeue_impl(&self, worker: usize, stats: Option<&mut Stats>) -> Result<T, QueueError> {
        let mut inner = self.inner.lock().expect("lock poisoned");
        let old_head = inner.head;
        let new_head = unsafe { (*old_head).next };
        if new_head.is_null() {
            return Err(QueueError::Empty);
        }
        let value = unsafe { (*new_head).value.take() }.expect("live node must carry a value");
        inner.head = new_head;
        unsafe {
            (*old_head).next = inner.freelists[worker];
        }
        inner.freelists[worker] = old_head;
        if let Some(s) = stats {
            s.record_freelist_push();
        }
        Ok(value)
    }
}

impl<T> Drop for LockedQueue<T> {
    fn drop(&mut self) {
        let inner = self.inner.get_mut().expect("lock poisoned");
        let mut n = inner.head;
        while !n.is_null() {
            let next = unsafe { (*n).next };
            unsafe { drop(Box::from_raw(n)) };
            n = next;
        }
        for &head in &inner.freelists {
            let mut n = head;
            while !n.is_null() {
                let next = unsafe { (*n).next };
                unsafe { drop(Box::from_raw(n)) };
                n = next;
            }
        }
    }
}

impl<T: Send> QueueBackend<T> for LockedQueue<T> {
    type Worker<'q> = LockedWorker<'q, T> where Self: 'q;

    fn register(&self) -> Result<Self::Worker<'_>, QueueError> {
        let id = self.registry.register()?;
        Ok(LockedWorker { queue: self, id })
    }

    fn len(&self) -> usize {
        LockedQueue::len(self)
    }
}

pub struct LockedWorker<'q, T> {
    queue: &'q LockedQueue<T>,
    id: usize,
}

impl<'q, T: Send> WorkerHandle<T> for LockedWorker<'q, T> {
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
