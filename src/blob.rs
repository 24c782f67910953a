//! Growable byte payloads with buffered storage.
//!
//! A blob is written exactly once, either through an [`OutputStream`] or by
//! copying from a reader with [`WritableBlob::read_from`], and read back any
//! number of times once committed. [`MemoryBlob`] keeps everything in memory;
//! [`OverflowBlob`] keeps a bounded amount in memory and spills the rest to a
//! temporary file.

use std::cmp;
use std::env;
use std::io;
use std::path;

use crate::Error;
use crate::Result;

mod chunk;
pub mod memory;
pub mod overflow;
mod state;

pub use memory::MemoryBlob;
pub use overflow::OverflowBlob;
pub use state::State;

/// Upper bound on a single `read` issued by `read_from`.
const COPY_BUFFER: usize = 4096;

/// Read side shared by all blobs.
pub trait Blob {
    type Reader<'a>: io::Read
    where
        Self: 'a;

    /// Number of bytes written so far.
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Open a sequential reader over the current contents.
    fn open_input_stream(&self) -> Result<Self::Reader<'_>>;

    /// Copy the current contents to `sink`, returning the number of bytes copied.
    ///
    /// Equivalent to copying from `open_input_stream`, but avoids the reader's
    /// intermediate buffer.
    fn write_to<W: io::Write + ?Sized>(&self, sink: &mut W) -> Result<u64>;
}

pub(crate) mod sealed {
    use std::io;

    use super::state::Lifecycle;
    use crate::Result;

    /// Storage hooks behind the public state machine.
    pub trait Storage {
        fn lifecycle(&self) -> &Lifecycle;

        fn lifecycle_mut(&mut self) -> &mut Lifecycle;

        /// Fail if the backing storage is gone.
        fn check_live(&self) -> Result<()> {
            Ok(())
        }

        fn append(&mut self, data: &[u8]) -> io::Result<()>;

        /// Make every appended byte visible to readers.
        fn seal(&mut self) -> io::Result<()>;
    }
}

/// Write side and lifecycle shared by all blobs.
pub trait WritableBlob: Blob + sealed::Storage {
    /// Whether reads are legal before the blob is committed.
    ///
    /// When true, a reader observes every byte written before each of its
    /// `read` calls started. It may report end of data and later return more.
    fn is_supporting_read_uncommitted(&self) -> bool;

    fn state(&self) -> State {
        self.lifecycle().state()
    }

    /// Open the single output stream of this blob. Closing it commits.
    fn open_output_stream(&mut self) -> Result<OutputStream<'_, Self>>
    where
        Self: Sized,
    {
        self.check_live()?;
        self.lifecycle_mut().open_output_stream()?;
        Ok(OutputStream {
            blob: self,
            closed: false,
        })
    }

    /// Copy from `source` until `length` bytes were copied or `source` is
    /// exhausted, optionally committing afterwards.
    fn read_from<R: io::Read + ?Sized>(
        &mut self,
        source: &mut R,
        length: Option<u64>,
        commit: bool,
    ) -> Result<u64> {
        self.check_live()?;
        self.lifecycle_mut().begin_read_from(commit)?;

        let mut buffer = [0u8; COPY_BUFFER];
        let mut total = 0u64;

        loop {
            let want = match length {
                None => buffer.len(),
                Some(length) => cmp::min(length - total, buffer.len() as u64) as usize,
            };

            if want == 0 {
                break;
            }

            let read = match source.read(&mut buffer[..want]) {
                Ok(0) => break,
                Ok(read) => read,
                Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
                Err(error) => return Err(Error::Io(error)),
            };

            self.append(&buffer[..read])?;
            total += read as u64;
        }

        if commit {
            self.seal()?;
            self.lifecycle_mut().commit()?;
        }

        Ok(total)
    }

    /// Like [`read_from`](WritableBlob::read_from), committing only if the
    /// blob was still new.
    fn read_from_auto<R: io::Read + ?Sized>(
        &mut self,
        source: &mut R,
        length: Option<u64>,
    ) -> Result<u64> {
        let commit = match self.state() {
            State::New => true,
            State::Uncommitted => false,
            State::Committed => return Err(Error::InvalidState("blob already committed")),
        };
        self.read_from(source, length, commit)
    }

    /// Free backing resources. Safe to call more than once.
    fn release(&mut self) -> Result<()>;
}

/// The single writer of a blob.
///
/// Commits the blob when closed. Dropping an open stream closes it and logs
/// any failure.
#[derive(Debug)]
pub struct OutputStream<'a, B: WritableBlob> {
    blob: &'a mut B,
    closed: bool,
}

impl<'a, B: WritableBlob> OutputStream<'a, B> {
    pub fn close(mut self) -> Result<()> {
        self.commit()
    }

    /// Copy from `source` into the blob between writes through this stream.
    ///
    /// Never commits; closing the stream does.
    pub fn read_from<R: io::Read + ?Sized>(
        &mut self,
        source: &mut R,
        length: Option<u64>,
    ) -> Result<u64> {
        self.blob.read_from(source, length, false)
    }

    fn commit(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.blob.seal()?;
        self.blob.lifecycle_mut().commit()
    }
}

impl<'a, B: WritableBlob> io::Write for OutputStream<'a, B> {
    fn write(&mut self, buffer: &[u8]) -> io::Result<usize> {
        self.blob.lifecycle().check_writable()?;
        self.blob.append(buffer)?;
        Ok(buffer.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a, B: WritableBlob> Drop for OutputStream<'a, B> {
    fn drop(&mut self) {
        if let Err(error) = self.commit() {
            log::warn!("Failed to commit blob on drop: {}", error);
        }
    }
}

/// Tuning for [`OverflowBlob`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Number of in-memory chunk slots before spilling.
    pub chunks: usize,
    /// Size of each chunk in bytes.
    pub chunk_size: usize,
    /// Directory the temporary file is created in.
    pub directory: path::PathBuf,
    pub prefix: String,
    pub suffix: String,
}

impl Config {
    pub fn new(chunks: usize, chunk_size: usize) -> Self {
        Config {
            chunks,
            chunk_size,
            ..Config::default()
        }
    }

    pub fn capacity(&self) -> u64 {
        self.chunks as u64 * self.chunk_size as u64
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunks == 0 {
            return Err(Error::Config(String::from(
                "Expected at least one chunk slot",
            )));
        }
        if self.chunk_size == 0 {
            return Err(Error::Config(String::from(
                "Expected chunk size greater than zero",
            )));
        }
        if self.prefix.contains(path::is_separator) || self.suffix.contains(path::is_separator) {
            return Err(Error::Config(format!(
                "Temporary file affixes must not contain path separators: `{}`, `{}`",
                self.prefix, self.suffix,
            )));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            chunks: 16,
            chunk_size: 4096,
            directory: env::temp_dir(),
            prefix: String::from("spill"),
            suffix: String::from(".tmp"),
        }
    }
}
