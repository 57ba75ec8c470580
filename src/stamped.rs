//! Stamped pointer encoding: a 48-bit node address packed with a 16-bit
//! version stamp into a single `u64`, loaded/stored/CAS'd atomically as one
//! word so that a thread observing "the same address twice" can tell it
//! apart from "the address was freed and reused in between" (the ABA
//! hazard).

use std::sync::atomic::{AtomicU64, Ordering};

const ADDR_BITS: u32 = 48;
const ADDR_MASK: u64 = (1u64 << ADDR_BITS) - 1;

pub type Stamp = u16;

/// Packs a raw node address and a stamp into one 64-bit word.
///
/// `addr` must fit in the low 48 bits; on every target this crate supports
/// (x86-64, aarch64 userspace) heap pointers already do.
#[inline]
pub fn pack(addr: usize, stamp: Stamp) -> u64 {
    debug_assert!(addr as u64 <= ADDR_MASK, "address does not fit in 48 bits");
    ((stamp as u64) << ADDR_BITS) | (addr as u64 & ADDR_MASK)
}

/// Splits a packed word back into `(addr, stamp)`.
#[inline]
pub fn unpack(word: u64) -> (usize, Stamp) {
    let addr = (word & ADDR_MASK) as usize;
    let stamp = (word >> ADDR_BITS) as Stamp;
    (addr, stamp)
}

/// An atomic stamped pointer to a `T`. Null is represented by address `0`.
#[derive(Debug)]
pub struct StampedPtr<T> {
    word: AtomicU64,
    _marker: std::marker::PhantomData<*mut T>,
}

unsafe impl<T: Send> Send for StampedPtr<T> {}
unsafe impl<T: Send> Sync for StampedPtr<T> {}

impl<T> StampedPtr<T> {
    pub fn new(addr: *mut T, stamp: Stamp) -> Self {
        StampedPtr {
            word: AtomicU64::new(pack(addr as usize, stamp)),
            _marker: std::marker::PhantomData,
        }
    }

    pub fn null() -> Self {
        Self::new(std::ptr::null_mut(), 0)
    }

    #[inline]
    pub fn load(&self, order: Ordering) -> (*mut T, Stamp) {
        let (addr, stamp) = unpack(self.word.load(order));
        (addr as *mut T, stamp)
    }

    #[inline]
    pub fn store(&self, addr: *mut T, stamp: Stamp, order: Ordering) {
        self.word.store(pack(addr as usize, stamp), order);
    }

    /// Weak CAS on the whole packed word. Spurious failures are permitted:
    /// every call site already retries in a loop, and the weak form codegens
    /// better on load-linked/store-conditional architectures.
    #[inline]
    pub fn compare_exchange_weak(
        &self,
        expected_addr: *mut T,
        expected_stamp: Stamp,
        new_addr: *mut T,
        new_stamp: Stamp,
        success: Ordering,
        failure: Ordering,
    ) -> Result<(), (*mut T, Stamp)> {
        let expected = pack(expected_addr as usize, expected_stamp);
        let new = pack(new_addr as usize, new_stamp);
        match self
            .word
            .compare_exchange_weak(expected, new, success, failure)
        {
            Ok(_) => Ok(()),
            Err(actual) => {
                let (addr, stamp) = unpack(actual);
                Err((addr as *mut T, stamp))
            }
        }
    }
}
