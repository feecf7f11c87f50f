//! Fixed-capacity circular byte queue
//!
//! `head` is the next byte to pop and `tail` the next free slot. One slot is
//! always left unused so that `head == tail` means empty and
//! `tail + 1 == head` (mod N) means full.

/// Circular byte queue holding at most `N - 1` bytes.
pub struct RingBuffer<const N: usize> {
    buffer: [u8; N],
    head: usize,
    tail: usize,
}

impl<const N: usize> RingBuffer<N> {
    const VALID: () = assert!(N >= 2, "ring buffer needs at least two slots");

    /// Create an empty ring buffer
    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::VALID;
        Self {
            buffer: [0; N],
            head: 0,
            tail: 0,
        }
    }

    /// Number of bytes the buffer can hold
    pub const fn capacity(&self) -> usize {
        N - 1
    }

    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    pub fn is_full(&self) -> bool {
        Self::advance(self.tail) == self.head
    }

    /// Number of bytes currently queued
    pub fn len(&self) -> usize {
        if self.tail >= self.head {
            self.tail - self.head
        } else {
            N - self.head + self.tail
        }
    }

    /// Space left before the buffer is full
    pub fn free(&self) -> usize {
        self.capacity() - self.len()
    }

    /// Push a byte at the tail.
    ///
    /// Returns `false` and leaves the buffer untouched if it is full.
    pub fn try_push(&mut self, byte: u8) -> bool {
        let next = Self::advance(self.tail);
        if next == self.head {
            return false;
        }
        self.buffer[self.tail] = byte;
        self.tail = next;
        true
    }

    /// Pop the oldest byte, or `None` if the buffer is empty.
    pub fn try_pop(&mut self) -> Option<u8> {
        if self.is_empty() {
            return None;
        }
        let byte = self.buffer[self.head];
        self.head = Self::advance(self.head);
        Some(byte)
    }

    fn advance(index: usize) -> usize {
        let next = index + 1;
        if next == N {
            0
        } else {
            next
        }
    }
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}
