use std::cmp;
use std::io;

/// Growable list of fixed-size chunks with a write cursor.
///
/// Invariant: every chunk before `index` is full, and `chunks.len()` is
/// either `index` (next chunk not yet allocated) or `index + 1`.
#[derive(Debug)]
pub struct Chunks {
    size: usize,
    limit: Option<usize>,
    chunks: Vec<Box<[u8]>>,
    index: usize,
    offset: usize,
}

impl Chunks {
    pub fn unbounded(size: usize) -> Self {
        Self::new(size, None)
    }

    pub fn bounded(size: usize, limit: usize) -> Self {
        Self::new(size, Some(limit))
    }

    fn new(size: usize, limit: Option<usize>) -> Self {
        debug_assert!(size > 0);
        Chunks {
            size,
            limit,
            chunks: Vec::new(),
            index: 0,
            offset: 0,
        }
    }

    pub fn len(&self) -> u64 {
        self.index as u64 * self.size as u64 + self.offset as u64
    }

    /// Copy as much of `data` as fits, returning the number of bytes accepted.
    ///
    /// Only bounded lists can accept fewer than `data.len()` bytes, and only
    /// once every slot is full.
    pub fn write(&mut self, data: &[u8]) -> usize {
        let mut written = 0;

        while written < data.len() {
            if self.offset == self.size {
                if self.limit.map_or(false, |limit| self.index + 1 >= limit) {
                    break;
                }
                self.index += 1;
                self.offset = 0;
            }

            if self.index == self.chunks.len() {
                log::trace!("Allocating chunk {} ({} bytes)", self.index, self.size);
                self.chunks.push(vec![0u8; self.size].into_boxed_slice());
            }

            let chunk = &mut self.chunks[self.index];
            let count = cmp::min(self.size - self.offset, data.len() - written);
            chunk[self.offset..self.offset + count].copy_from_slice(&data[written..written + count]);
            self.offset += count;
            written += count;
        }

        written
    }

    /// Copy bytes starting at absolute `position` into `buffer`.
    ///
    /// Returns `0` at the current end of data.
    pub fn read_at(&self, position: u64, buffer: &mut [u8]) -> usize {
        let len = self.len();
        if position >= len || buffer.is_empty() {
            return 0;
        }

        let index = (position / self.size as u64) as usize;
        let offset = (position % self.size as u64) as usize;
        let available = cmp::min(self.size - offset, (len - position) as usize);
        let count = cmp::min(available, buffer.len());

        buffer[..count].copy_from_slice(&self.chunks[index][offset..offset + count]);
        count
    }

    /// Write every buffered byte to `sink` in order.
    pub fn write_to<W: io::Write + ?Sized>(&self, sink: &mut W) -> io::Result<u64> {
        let mut remaining = self.len();
        for chunk in &self.chunks {
            if remaining == 0 {
                break;
            }
            let count = cmp::min(remaining, chunk.len() as u64) as usize;
            sink.write_all(&chunk[..count])?;
            remaining -= count as u64;
        }
        Ok(self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_tracks_cursor() {
        let mut chunks = Chunks::unbounded(4);
        assert_eq!(chunks.len(), 0);
        assert_eq!(chunks.write(b"abcdef"), 6);
        assert_eq!(chunks.len(), 6);
        assert_eq!(chunks.write(b"gh"), 2);
        assert_eq!(chunks.len(), 8);
        assert_eq!(chunks.chunks.len(), 2);
    }

    #[test]
    fn full_chunk_defers_allocation() {
        let mut chunks = Chunks::unbounded(4);
        chunks.write(b"abcd");
        assert_eq!(chunks.chunks.len(), 1);
        chunks.write(b"e");
        assert_eq!(chunks.chunks.len(), 2);
    }

    #[test]
    fn bounded_stops_at_capacity() {
        let mut chunks = Chunks::bounded(4, 2);
        assert_eq!(chunks.write(b"abcdefghij"), 8);
        assert_eq!(chunks.len(), 8);
        assert_eq!(chunks.write(b"k"), 0);
    }

    #[test]
    fn read_at_crosses_chunks() {
        let mut chunks = Chunks::unbounded(3);
        chunks.write(b"0123456");

        let mut buffer = [0u8; 8];
        assert_eq!(chunks.read_at(2, &mut buffer), 1);
        assert_eq!(&buffer[..1], b"2");
        assert_eq!(chunks.read_at(3, &mut buffer), 3);
        assert_eq!(&buffer[..3], b"345");
        assert_eq!(chunks.read_at(6, &mut buffer), 1);
        assert_eq!(chunks.read_at(7, &mut buffer), 0);
    }

    #[test]
    fn write_to_emits_partial_tail() -> io::Result<()> {
        let mut chunks = Chunks::unbounded(3);
        chunks.write(b"hello");
        let mut sink = Vec::new();
        assert_eq!(chunks.write_to(&mut sink)?, 5);
        assert_eq!(sink, b"hello");
        Ok(())
    }
}
