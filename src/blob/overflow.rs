use std::fs;
use std::io;
use std::io::Seek as _;
use std::io::Write as _;
use std::mem;
use std::path;

use crate::blob::chunk::Chunks;
use crate::blob::sealed;
use crate::blob::state::Lifecycle;
use crate::blob::Config;
use crate::file;
use crate::Blob;
use crate::Error;
use crate::Result;
use crate::WritableBlob;

/// Blob that buffers up to `chunks × chunk_size` bytes in memory and moves
/// everything to a temporary file once that is exceeded.
///
/// Reads are only legal after commit. The temporary file is deleted by
/// [`release`](WritableBlob::release) or when the blob is dropped.
#[derive(Debug)]
pub struct OverflowBlob {
    config: Config,
    lifecycle: Lifecycle,
    storage: Storage,
}

#[derive(Debug)]
enum Storage {
    Memory(Chunks),
    File {
        writer: io::BufWriter<file::Temp>,
        len: u64,
    },
    Released,
}

impl OverflowBlob {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(OverflowBlob {
            storage: Storage::Memory(Chunks::bounded(config.chunk_size, config.chunks)),
            lifecycle: Lifecycle::default(),
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_spilled(&self) -> bool {
        matches!(self.storage, Storage::File { .. })
    }

    /// Path of the temporary file, if the blob has spilled.
    pub fn path(&self) -> Option<&path::Path> {
        match &self.storage {
            Storage::File { writer, .. } => Some(writer.get_ref().path()),
            Storage::Memory(_) | Storage::Released => None,
        }
    }

    fn check_readable(&self) -> Result<()> {
        sealed::Storage::check_live(self)?;
        self.lifecycle
            .check_readable(self.is_supporting_read_uncommitted())
    }

    /// Move the buffered chunks plus `rest` into a fresh temporary file.
    ///
    /// On failure the chunks stay in place and the partial file is removed.
    fn spill(&mut self, rest: &[u8]) -> io::Result<()> {
        let chunks = match &self.storage {
            Storage::Memory(chunks) => chunks,
            Storage::File { .. } | Storage::Released => {
                unreachable!("[UNREACHABLE]: spilling blob without memory storage")
            }
        };

        let temp = file::Temp::new(
            &self.config.directory,
            &self.config.prefix,
            &self.config.suffix,
        )?;
        let mut writer = io::BufWriter::with_capacity(self.config.chunk_size, temp);
        let buffered = chunks.write_to(&mut writer)?;
        writer.write_all(rest)?;

        log::debug!(
            "Spilled {} buffered bytes to `{}`",
            buffered,
            writer.get_ref().path().display(),
        );

        self.storage = Storage::File {
            writer,
            len: buffered + rest.len() as u64,
        };
        Ok(())
    }
}

impl Blob for OverflowBlob {
    type Reader<'a> = Reader<'a>;

    fn len(&self) -> u64 {
        match &self.storage {
            Storage::Memory(chunks) => chunks.len(),
            Storage::File { len, .. } => *len,
            Storage::Released => 0,
        }
    }

    fn open_input_stream(&self) -> Result<Self::Reader<'_>> {
        self.check_readable()?;
        match &self.storage {
            Storage::Memory(chunks) => Ok(Reader::Memory {
                chunks,
                position: 0,
                mark: 0,
            }),
            Storage::File { writer, .. } => Ok(Reader::File {
                file: io::BufReader::new(writer.get_ref().reopen()?),
                mark: 0,
            }),
            Storage::Released => unreachable!("[UNREACHABLE]: checked by `check_readable`"),
        }
    }

    fn write_to<W: io::Write + ?Sized>(&self, sink: &mut W) -> Result<u64> {
        self.check_readable()?;
        match &self.storage {
            Storage::Memory(chunks) => Ok(chunks.write_to(sink)?),
            Storage::File { writer, .. } => {
                let mut file = writer.get_ref().reopen()?;
                Ok(io::copy(&mut file, sink)?)
            }
            Storage::Released => unreachable!("[UNREACHABLE]: checked by `check_readable`"),
        }
    }
}

impl sealed::Storage for OverflowBlob {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lifecycle
    }

    fn check_live(&self) -> Result<()> {
        match self.storage {
            Storage::Released => Err(Error::InvalidState("blob has been released")),
            Storage::Memory(_) | Storage::File { .. } => Ok(()),
        }
    }

    fn append(&mut self, data: &[u8]) -> io::Result<()> {
        match &mut self.storage {
            Storage::Memory(chunks) => {
                let accepted = chunks.write(data);
                if accepted < data.len() {
                    self.spill(&data[accepted..])?;
                }
                Ok(())
            }
            Storage::File { writer, len } => {
                writer.write_all(data)?;
                *len += data.len() as u64;
                Ok(())
            }
            Storage::Released => Err(Error::InvalidState("blob has been released").into()),
        }
    }

    fn seal(&mut self) -> io::Result<()> {
        match &mut self.storage {
            Storage::File { writer, .. } => writer.flush(),
            Storage::Memory(_) | Storage::Released => Ok(()),
        }
    }
}

impl WritableBlob for OverflowBlob {
    fn is_supporting_read_uncommitted(&self) -> bool {
        false
    }

    fn release(&mut self) -> Result<()> {
        match mem::replace(&mut self.storage, Storage::Released) {
            Storage::File { writer, .. } => {
                // Unflushed bytes are discarded; only the file itself matters here.
                let (temp, _) = writer.into_parts();
                log::debug!("Releasing spilled blob `{}`", temp.path().display());
                drop(temp);
            }
            Storage::Memory(_) | Storage::Released => (),
        }
        Ok(())
    }
}

/// Reader over a committed [`OverflowBlob`].
#[derive(Debug)]
pub enum Reader<'a> {
    Memory {
        chunks: &'a Chunks,
        position: u64,
        mark: u64,
    },
    File {
        file: io::BufReader<fs::File>,
        mark: u64,
    },
}

impl<'a> Reader<'a> {
    /// Remember the current position for a later [`reset`](Reader::reset).
    pub fn mark(&mut self) -> io::Result<()> {
        match self {
            Reader::Memory { position, mark, .. } => *mark = *position,
            Reader::File { file, mark } => *mark = file.stream_position()?,
        }
        Ok(())
    }

    pub fn reset(&mut self) -> io::Result<()> {
        match self {
            Reader::Memory { position, mark, .. } => *position = *mark,
            Reader::File { file, mark } => {
                file.seek(io::SeekFrom::Start(*mark))?;
            }
        }
        Ok(())
    }
}

impl<'a> io::Read for Reader<'a> {
    fn read(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        match self {
            Reader::Memory {
                chunks, position, ..
            } => {
                let count = chunks.read_at(*position, buffer);
                *position += count as u64;
                Ok(count)
            }
            Reader::File { file, .. } => io::Read::read(file, buffer),
        }
    }
}
