use crate::{CHUNK_CAPACITY, Ring};

/// One fixed-size slice of a byte stream.
///
/// A chunk is a [`Ring`] of at most [`CHUNK_CAPACITY`] bytes. It is an owned
/// value that moves through the [`Pool`](crate::Pool); it is never shared
/// between threads, so it carries no lock of its own. The last chunk of a
/// stream is usually only partially filled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    bytes: Ring<u8>,
}

impl Default for Chunk {
    fn default() -> Self {
        Self::new()
    }
}

impl Chunk {
    pub fn new() -> Self {
        Self {
            bytes: Ring::new(CHUNK_CAPACITY),
        }
    }

    /// Builds a chunk from the first [`CHUNK_CAPACITY`] bytes of `data`.
    pub fn from_slice(data: &[u8]) -> Self {
        let mut chunk = Self::new();
        chunk.fill(data);
        chunk
    }

    /// Appends as many bytes of `data` as fit, returning how many were taken.
    pub fn fill(&mut self, data: &[u8]) -> usize {
        let n = data.len().min(self.bytes.remaining());
        self.bytes.extend(data[..n].iter().copied());
        n
    }

    /// Appends one byte. A full chunk drops its oldest byte.
    pub fn push(&mut self, byte: u8) {
        self.bytes.push(byte);
    }

    pub fn pop(&mut self) -> Option<u8> {
        self.bytes.pop()
    }

    pub fn front(&self) -> Option<u8> {
        self.bytes.front().copied()
    }

    pub fn back(&self) -> Option<u8> {
        self.bytes.back().copied()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.bytes.is_full()
    }

    pub fn capacity(&self) -> usize {
        self.bytes.capacity()
    }

    /// The chunk's bytes as (at most) two contiguous slices, in order.
    pub fn as_slices(&self) -> (&[u8], &[u8]) {
        self.bytes.as_slices()
    }

    /// Appends this chunk's bytes to `out`.
    pub fn copy_into(&self, out: &mut Vec<u8>) {
        let (a, b) = self.as_slices();
        out.extend_from_slice(a);
        out.extend_from_slice(b);
    }

    pub fn into_bytes(self) -> Vec<u8> {
        Vec::from(self.bytes.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_chunk_is_empty() {
        let chunk = Chunk::new();
        assert!(chunk.is_empty());
        assert_eq!(chunk.capacity(), CHUNK_CAPACITY);
        assert_eq!(chunk.front(), None);
    }

    #[test]
    fn fill_stops_at_capacity() {
        let data = vec![7u8; CHUNK_CAPACITY + 10];
        let mut chunk = Chunk::new();

        assert_eq!(chunk.fill(&data), CHUNK_CAPACITY);
        assert!(chunk.is_full());
        assert_eq!(chunk.fill(b"more"), 0);
    }

    #[test]
    fn fill_appends_to_partial_chunk() {
        let mut chunk = Chunk::from_slice(b"abc");
        assert_eq!(chunk.fill(b"def"), 3);
        assert_eq!(chunk.into_bytes(), b"abcdef");
    }

    #[test]
    fn pop_yields_bytes_in_order() {
        let mut chunk = Chunk::from_slice(&[0x00, 0xFF, 0x10]);
        assert_eq!(chunk.front(), Some(0x00));
        assert_eq!(chunk.back(), Some(0x10));
        assert_eq!(chunk.pop(), Some(0x00));
        assert_eq!(chunk.pop(), Some(0xFF));
        assert_eq!(chunk.pop(), Some(0x10));
        assert_eq!(chunk.pop(), None);
    }

    #[test]
    fn push_on_full_chunk_drops_oldest_byte() {
        let mut chunk = Chunk::from_slice(&vec![1u8; CHUNK_CAPACITY]);
        chunk.push(2);

        assert_eq!(chunk.len(), CHUNK_CAPACITY);
        assert_eq!(chunk.back(), Some(2));
    }

    #[test]
    fn copy_into_appends() {
        let chunk = Chunk::from_slice(b"world");
        let mut out = b"hello ".to_vec();
        chunk.copy_into(&mut out);
        assert_eq!(out, b"hello world");
    }
}
