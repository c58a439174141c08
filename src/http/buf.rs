//! # Fixed-Capacity I/O Buffers
//!
//! `IoBuf` is a read buffer with explicit position accounting: bytes
//! between `pos` and `end` are unconsumed input, bytes past `end` are
//! free space for the next read. The capacity never changes after
//! allocation - growth is expressed by *promotion* into a separately
//! allocated larger buffer, which is a policy decision of the
//! connection core, not of the buffer.

/// A fixed-capacity buffer with consumed/filled cursors.
#[derive(Debug)]
pub struct IoBuf {
    data: Box<[u8]>,
    pos: usize,
    end: usize,
}

impl IoBuf {
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0u8; capacity].into_boxed_slice(),
            pos: 0,
            end: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Unconsumed input bytes.
    pub fn used(&self) -> usize {
        self.end - self.pos
    }

    /// Room left for the next read.
    pub fn free(&self) -> usize {
        self.data.len() - self.end
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data[self.pos..self.end]
    }

    /// Free space to read into; pair with [`IoBuf::fill`].
    pub fn spare_mut(&mut self) -> &mut [u8] {
        &mut self.data[self.end..]
    }

    /// Records `n` bytes read into the spare space.
    pub fn fill(&mut self, n: usize) {
        debug_assert!(self.end + n <= self.data.len());
        self.end += n;
    }

    /// Consumes `n` bytes from the front of the input.
    pub fn advance(&mut self, n: usize) {
        debug_assert!(self.pos + n <= self.end);
        self.pos += n;
    }

    /// Moves the unconsumed residual to the start of the buffer.
    pub fn compact(&mut self) {
        if self.pos == 0 {
            return;
        }
        self.data.copy_within(self.pos..self.end, 0);
        self.end -= self.pos;
        self.pos = 0;
    }

    /// Drops all input and reclaims the full capacity.
    pub fn reset(&mut self) {
        self.pos = 0;
        self.end = 0;
    }

    /// Seeds this buffer with the residual of `other`.
    pub fn take_residual(&mut self, other: &IoBuf) {
        debug_assert!(other.used() <= self.free());
        let n = other.used();
        self.data[self.end..self.end + n].copy_from_slice(other.bytes());
        self.end += n;
    }

    /// Consumes the buffer, returning the input bytes. Free of copying
    /// when the buffer was filled exactly once to capacity.
    pub fn into_vec(self) -> Vec<u8> {
        if self.pos == 0 && self.end == self.data.len() {
            self.data.into_vec()
        } else {
            self.data[self.pos..self.end].to_vec()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_and_advance() {
        let mut buf = IoBuf::new(8);
        assert_eq!(buf.free(), 8);

        buf.spare_mut()[..3].copy_from_slice(b"abc");
        buf.fill(3);
        assert_eq!(buf.bytes(), b"abc");
        assert_eq!(buf.free(), 5);

        buf.advance(2);
        assert_eq!(buf.bytes(), b"c");
        assert_eq!(buf.used(), 1);
    }

    #[test]
    fn compact_moves_residual() {
        let mut buf = IoBuf::new(8);
        buf.spare_mut()[..6].copy_from_slice(b"abcdef");
        buf.fill(6);
        buf.advance(4);

        buf.compact();
        assert_eq!(buf.bytes(), b"ef");
        assert_eq!(buf.free(), 6);
    }

    #[test]
    fn promotion_seed() {
        let mut small = IoBuf::new(4);
        small.spare_mut().copy_from_slice(b"abcd");
        small.fill(4);
        small.advance(1);

        let mut large = IoBuf::new(16);
        large.take_residual(&small);
        assert_eq!(large.bytes(), b"bcd");
        assert_eq!(large.free(), 13);
    }
}
