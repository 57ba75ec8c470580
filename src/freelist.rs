//! Per-worker recyclable-node freelist.
//!
//! Each worker owns exactly one slot; only the owner ever pushes or pops it,
//! so there is no contention on the slot itself. The `StampedPtr` discipline
//! is kept anyway so that a concurrent reader of a node's `next` field (via
//! the queue, not the freelist) still sees consistent memory-ordering
//! guarantees against this thread's pushes.

use crate::node::Node;
use crate::stamped::StampedPtr;
use crossbeam_utils::CachePadded;
use std::sync::atomic::Ordering;

pub struct Freelist<T> {
    head: CachePadded<StampedPtr<Node<T>>>,
}

impl<T> Default for Freelist<T> {
    fn default() -> Self {
        Freelist {
            head: CachePadded::new(StampedPtr::null()),
        }
    }
}

impl<T> Freelist<T> {
    /// Pushes a logically-dead node onto this worker's freelist.
    ///
    /// # Safety
    /// `node` must be a live, uniquely-owned `Node<T>` pointer that is no
    /// longer reachable from the queue's live chain.
    pub unsafe fn push(&self, node: *mut Node<T>) {
        let (old_head, stamp) = self.head.load(Ordering::Acquire);
        (*node).next.store(old_head, stamp, Ordering::Release);
        self.head
            .store(node, stamp.wrapping_add(1), Ordering::Release);
    }

    /// Pops a recyclable node, or `None` on a freelist miss (caller falls
    /// through to the allocator).
    pub fn pop(&self) -> Option<*mut Node<T>> {
        let (head, stamp) = self.head.load(Ordering::Acquire);
        if head.is_null() {
            return None;
        }
        // SAFETY: `head` came from a prior `push` by this same worker and
        // has not been freed (freelist nodes stay live until `destroy`).
        let (next, _) = unsafe { (*head).next.load(Ordering::Acquire) };
        self.head
            .store(next, stamp.wrapping_add(1), Ordering::Release);
        Some(head)
    }

    /// Drains every node still on this freelist, calling `f` on each raw
    /// pointer. Used only by `destroy`/`Drop`, which the caller must ensure
    /// runs with no concurrent access.
    pub fn drain(&self, mut f: impl FnMut(*mut Node<T>)) {
        let mut current = self.head.load(Ordering::Acquire).0;
        while !current.is_null() {
            let next = unsafe { (*current).next.load(Ordering::Acquire).0 };
            f(current);
            current = next;
        }
    }
}
