//! Node storage for both the lock-free and locked queues.
//!
//! A node is either reachable from the queue's live chain or sitting on
//! exactly one per-thread freelist; in both cases its memory stays valid
//! until the owning queue is dropped.

use crate::stamped::StampedPtr;
use std::sync::atomic::Ordering;

/// Sentinel nodes carry no meaningful `value`; `Option` makes that explicit
/// instead of relying on a caller-supplied default value as the C original
/// does (`node.value` is simply uninitialized garbage for the sentinel).
pub struct Node<T> {
    pub value: Option<T>,
    pub next: StampedPtr<Node<T>>,
}

impl<T> Node<T> {
    pub fn sentinel() -> Box<Node<T>> {
        Box::new(Node {
            value: None,
            next: StampedPtr::null(),
        })
    }

    pub fn with_value(value: T) -> Box<Node<T>> {
        Box::new(Node {
            value: Some(value),
            next: StampedPtr::null(),
        })
    }
}

/// Leaks a boxed node into a raw pointer for storage in an atomic word.
pub fn into_raw<T>(node: Box<Node<T>>) -> *mut Node<T> {
    Box::into_raw(node)
}

/// Reclaims a raw node pointer produced by [`into_raw`].
///
/// # Safety
/// `ptr` must be non-null and must not be (or become) reachable from any
/// other queue link or freelist after this call.
pub unsafe fn from_raw<T>(ptr: *mut Node<T>) -> Box<Node<T>> {
    debug_assert!(!ptr.is_null());
    Box::from_raw(ptr)
}

/// Reads the next-pointer's `(addr, stamp)` off a live node.
///
/// # Safety
/// `ptr` must point at a live `Node<T>` (queue-reachable or on a freelist).
pub unsafe fn next_of<T>(ptr: *mut Node<T>, order: Ordering) -> (*mut Node<T>, u16) {
    (*ptr).next.load(order)
}
