use std::io;

use crate::base64;
use crate::Error;
use crate::Result;

/// Decoded bytes batched per write to the destination.
const BUFFER: usize = 3 * 256;

/// Streaming base64 decoder writing bytes to an [`io::Write`].
///
/// Up to three characters are carried over between calls. ASCII whitespace
/// between characters is skipped; anything else outside the alphabet is an
/// error.
#[derive(Debug)]
pub struct Decoder<W: io::Write> {
    inner: W,
    group: [u8; 4],
    offsets: [u64; 4],
    pending: usize,
    offset: u64,
}

impl<W: io::Write> Decoder<W> {
    pub fn new(inner: W) -> Self {
        Decoder {
            inner,
            group: [0; 4],
            offsets: [0; 4],
            pending: 0,
            offset: 0,
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn write_str(&mut self, text: &str) -> Result<()> {
        self.decode(text.as_bytes())
    }

    /// Decode base64 `chars`, given as ASCII bytes.
    ///
    /// Bytes decoded before an error are still written to the destination.
    pub fn decode(&mut self, chars: &[u8]) -> Result<()> {
        let mut output = [0u8; BUFFER];
        let mut filled = 0;

        for &byte in chars {
            let offset = self.offset;
            self.offset += 1;

            if byte.is_ascii_whitespace() {
                continue;
            }

            if byte != base64::PAD && base64::value(byte).is_none() {
                self.inner.write_all(&output[..filled])?;
                return Err(Error::InvalidEncoding {
                    offset,
                    reason: format!("unexpected byte {:#04x}", byte),
                });
            }

            self.group[self.pending] = byte;
            self.offsets[self.pending] = offset;
            self.pending += 1;

            if self.pending < 4 {
                continue;
            }

            self.pending = 0;
            let mut decoded = [0u8; 3];
            match base64::decode_group(&self.group, &mut decoded) {
                Ok(len) => {
                    if filled + len > BUFFER {
                        self.inner.write_all(&output[..filled])?;
                        filled = 0;
                    }
                    output[filled..filled + len].copy_from_slice(&decoded[..len]);
                    filled += len;
                }
                Err(index) => {
                    self.inner.write_all(&output[..filled])?;
                    return Err(Error::InvalidEncoding {
                        offset: self.offsets[index],
                        reason: String::from("padding in the first half of a group"),
                    });
                }
            }
        }

        self.inner.write_all(&output[..filled])?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        Ok(self.inner.flush()?)
    }

    /// Check that no partial group is left over and flush the destination.
    pub fn close(&mut self) -> Result<()> {
        if self.pending != 0 {
            return Err(Error::InvalidEncoding {
                offset: self.offset,
                reason: format!("truncated group of {} characters", self.pending),
            });
        }
        self.flush()
    }

    pub fn finish(mut self) -> Result<W> {
        self.close()?;
        Ok(self.inner)
    }
}

impl<W: io::Write> io::Write for Decoder<W> {
    fn write(&mut self, buffer: &[u8]) -> io::Result<usize> {
        self.decode(buffer)?;
        Ok(buffer.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
