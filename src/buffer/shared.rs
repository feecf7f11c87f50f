//! Ring buffer shared between interrupt and main context
//!
//! Each access holds a critical section only for as long as it takes to move
//! bytes in or out, never across a call into the radio stack.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use super::ring::RingBuffer;

/// A [`RingBuffer`] behind a critical-section mutex.
pub struct SharedRing<const N: usize> {
    inner: Mutex<CriticalSectionRawMutex, RefCell<RingBuffer<N>>>,
}

impl<const N: usize> SharedRing<N> {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(RingBuffer::new())),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock(|ring| ring.borrow().is_empty())
    }

    pub fn is_full(&self) -> bool {
        self.inner.lock(|ring| ring.borrow().is_full())
    }

    pub fn len(&self) -> usize {
        self.inner.lock(|ring| ring.borrow().len())
    }

    pub fn try_push(&self, byte: u8) -> bool {
        self.inner.lock(|ring| ring.borrow_mut().try_push(byte))
    }

    pub fn try_pop(&self) -> Option<u8> {
        self.inner.lock(|ring| ring.borrow_mut().try_pop())
    }

    /// Push bytes in order until the ring fills up.
    ///
    /// Returns how many bytes of `data` were accepted.
    pub fn push_slice(&self, data: &[u8]) -> usize {
        self.inner.lock(|ring| {
            let mut ring = ring.borrow_mut();
            data.iter().take_while(|&&byte| ring.try_push(byte)).count()
        })
    }

    /// Pop bytes into `out` until it is full or the ring is empty.
    ///
    /// Returns how many bytes were written to `out`.
    pub fn pop_into(&self, out: &mut [u8]) -> usize {
        self.inner.lock(|ring| {
            let mut ring = ring.borrow_mut();
            let mut count = 0;
            for slot in out.iter_mut() {
                match ring.try_pop() {
                    Some(byte) => {
                        *slot = byte;
                        count += 1;
                    }
                    None => break,
                }
            }
            count
        })
    }
}

impl<const N: usize> Default for SharedRing<N> {
    fn default() -> Self {
        Self::new()
    }
}
