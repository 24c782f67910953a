use std::cell::RefCell;
use std::io;
use std::rc::Rc;

use crate::blob::chunk::Chunks;
use crate::blob::sealed;
use crate::blob::state::Lifecycle;
use crate::Blob;
use crate::Result;
use crate::WritableBlob;

pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Unbounded in-memory blob.
///
/// Readers share the chunk list with the blob, so a reader opened before the
/// blob is committed observes data appended later.
#[derive(Debug)]
pub struct MemoryBlob {
    lifecycle: Lifecycle,
    chunks: Rc<RefCell<Chunks>>,
}

impl MemoryBlob {
    pub fn new() -> Self {
        Self::with_chunk_size(DEFAULT_CHUNK_SIZE)
    }

    pub fn with_chunk_size(chunk_size: usize) -> Self {
        assert!(chunk_size > 0, "[INTERNAL ERROR]: zero chunk size");
        MemoryBlob {
            lifecycle: Lifecycle::default(),
            chunks: Rc::new(RefCell::new(Chunks::unbounded(chunk_size))),
        }
    }
}

impl Default for MemoryBlob {
    fn default() -> Self {
        Self::new()
    }
}

impl Blob for MemoryBlob {
    type Reader<'a> = Reader;

    fn len(&self) -> u64 {
        self.chunks.borrow().len()
    }

    fn open_input_stream(&self) -> Result<Self::Reader<'_>> {
        self.lifecycle
            .check_readable(self.is_supporting_read_uncommitted())?;
        Ok(Reader {
            chunks: Rc::clone(&self.chunks),
            position: 0,
            mark: 0,
        })
    }

    fn write_to<W: io::Write + ?Sized>(&self, sink: &mut W) -> Result<u64> {
        self.lifecycle
            .check_readable(self.is_supporting_read_uncommitted())?;
        Ok(self.chunks.borrow().write_to(sink)?)
    }
}

impl sealed::Storage for MemoryBlob {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lifecycle
    }

    fn append(&mut self, data: &[u8]) -> io::Result<()> {
        let written = self.chunks.borrow_mut().write(data);
        debug_assert_eq!(written, data.len());
        Ok(())
    }

    fn seal(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl WritableBlob for MemoryBlob {
    fn is_supporting_read_uncommitted(&self) -> bool {
        true
    }

    fn release(&mut self) -> Result<()> {
        // Chunks are freed with the last handle; nothing lives outside memory.
        Ok(())
    }
}

/// Reader over a [`MemoryBlob`] with its own position and mark.
#[derive(Debug)]
pub struct Reader {
    chunks: Rc<RefCell<Chunks>>,
    position: u64,
    mark: u64,
}

impl Reader {
    /// Remember the current position for a later [`reset`](Reader::reset).
    pub fn mark(&mut self) {
        self.mark = self.position;
    }

    pub fn reset(&mut self) {
        self.position = self.mark;
    }

    /// Bytes that can be read without reaching the current end of data.
    pub fn available(&self) -> u64 {
        self.chunks.borrow().len().saturating_sub(self.position)
    }
}

impl io::Read for Reader {
    fn read(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        let count = self.chunks.borrow().read_at(self.position, buffer);
        self.position += count as u64;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read as _;
    use std::io::Write as _;

    use super::*;
    use crate::Error;
    use crate::State;

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|index| (index % 251) as u8).collect()
    }

    #[test]
    fn output_stream_round_trip() -> anyhow::Result<()> {
        let data = pattern(10_000);
        let mut blob = MemoryBlob::with_chunk_size(1024);

        let mut stream = blob.open_output_stream()?;
        for chunk in data.chunks(333) {
            stream.write_all(chunk)?;
        }
        stream.close()?;

        assert_eq!(blob.state(), State::Committed);
        assert_eq!(blob.len(), data.len() as u64);

        let mut buffer = Vec::new();
        blob.open_input_stream()?.read_to_end(&mut buffer)?;
        assert_eq!(buffer, data);

        let mut sink = Vec::new();
        assert_eq!(blob.write_to(&mut sink)?, data.len() as u64);
        assert_eq!(sink, data);
        Ok(())
    }

    #[test]
    fn stream_writes_interleave_with_copies() -> anyhow::Result<()> {
        let body = pattern(3000);
        let mut blob = MemoryBlob::with_chunk_size(256);

        let mut stream = blob.open_output_stream()?;
        stream.write_all(b"head")?;
        assert_eq!(stream.read_from(&mut &body[..], Some(2000))?, 2000);
        stream.write_all(b"tail")?;
        stream.close()?;

        let mut buffer = Vec::new();
        blob.open_input_stream()?.read_to_end(&mut buffer)?;
        assert_eq!(buffer.len(), 2008);
        assert_eq!(&buffer[..4], b"head");
        assert_eq!(&buffer[4..2004], &body[..2000]);
        assert_eq!(&buffer[2004..], b"tail");
        Ok(())
    }

    #[test]
    fn second_output_stream_fails() -> anyhow::Result<()> {
        let mut blob = MemoryBlob::new();
        drop(blob.open_output_stream()?);
        assert!(matches!(
            blob.open_output_stream(),
            Err(Error::InvalidState(_))
        ));
        Ok(())
    }

    #[test]
    fn dropped_stream_commits() -> anyhow::Result<()> {
        let mut blob = MemoryBlob::new();
        {
            let mut stream = blob.open_output_stream()?;
            stream.write_all(b"abc")?;
        }
        assert_eq!(blob.state(), State::Committed);
        assert!(blob.read_from(&mut &b"more"[..], None, false).is_err());
        Ok(())
    }

    #[test]
    fn reader_observes_later_writes() -> anyhow::Result<()> {
        let mut blob = MemoryBlob::with_chunk_size(4);
        blob.read_from(&mut &b"abcde"[..], None, false)?;
        assert_eq!(blob.state(), State::Uncommitted);

        let mut reader = blob.open_input_stream()?;
        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer)?;
        assert_eq!(buffer, b"abcde");
        assert_eq!(reader.available(), 0);

        blob.read_from(&mut &b"fgh"[..], None, true)?;
        assert_eq!(reader.available(), 3);
        reader.read_to_end(&mut buffer)?;
        assert_eq!(buffer, b"abcdefgh");
        Ok(())
    }

    #[test]
    fn read_from_honours_length() -> anyhow::Result<()> {
        let data = pattern(9000);
        let mut blob = MemoryBlob::new();
        let copied = blob.read_from(&mut &data[..], Some(5000), true)?;
        assert_eq!(copied, 5000);
        assert_eq!(blob.len(), 5000);

        let mut sink = Vec::new();
        blob.write_to(&mut sink)?;
        assert_eq!(sink, &data[..5000]);
        Ok(())
    }

    #[test]
    fn read_from_auto_follows_state() -> anyhow::Result<()> {
        let mut blob = MemoryBlob::new();
        blob.read_from(&mut &b"ab"[..], None, false)?;
        blob.read_from_auto(&mut &b"cd"[..], None)?;
        assert_eq!(blob.state(), State::Uncommitted);

        let mut fresh = MemoryBlob::new();
        fresh.read_from_auto(&mut &b"cd"[..], None)?;
        assert_eq!(fresh.state(), State::Committed);
        assert!(fresh.read_from_auto(&mut &b"ef"[..], None).is_err());
        Ok(())
    }

    #[test]
    fn mark_and_reset() -> anyhow::Result<()> {
        let mut blob = MemoryBlob::with_chunk_size(2);
        blob.read_from(&mut &b"012345"[..], None, true)?;

        let mut reader = blob.open_input_stream()?;
        let mut buffer = [0u8; 2];
        reader.read_exact(&mut buffer)?;
        reader.mark();
        reader.read_exact(&mut buffer)?;
        assert_eq!(&buffer, b"23");
        reader.reset();
        reader.read_exact(&mut buffer)?;
        assert_eq!(&buffer, b"23");
        Ok(())
    }

    #[test]
    fn new_blob_is_not_readable() {
        let blob = MemoryBlob::new();
        assert!(blob.open_input_stream().is_err());
    }

    #[test]
    fn release_is_idempotent() -> anyhow::Result<()> {
        let mut blob = MemoryBlob::new();
        blob.read_from(&mut &b"data"[..], None, true)?;
        blob.release()?;
        blob.release()?;
        assert_eq!(blob.len(), 4);
        Ok(())
    }
}
