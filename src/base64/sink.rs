use std::fmt;
use std::io;
use std::str;

/// Destination for encoded characters.
///
/// The encoder hands over ASCII only, in groups of four.
pub trait Sink {
    fn put(&mut self, chars: &[u8]) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Called once the encoder is closed.
    fn close(&mut self) -> io::Result<()> {
        self.flush()
    }
}

impl<S: Sink + ?Sized> Sink for &mut S {
    fn put(&mut self, chars: &[u8]) -> io::Result<()> {
        (**self).put(chars)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

impl Sink for String {
    fn put(&mut self, chars: &[u8]) -> io::Result<()> {
        self.extend(chars.iter().copied().map(char::from));
        Ok(())
    }
}

impl Sink for Vec<u8> {
    fn put(&mut self, chars: &[u8]) -> io::Result<()> {
        self.extend_from_slice(chars);
        Ok(())
    }
}

const DEFAULT_CAPACITY: usize = 4096;

/// Buffered byte stream sink.
#[derive(Debug)]
pub struct Bytes<W: io::Write>(io::BufWriter<W>);

impl<W: io::Write> Bytes<W> {
    pub fn new(inner: W) -> Self {
        Self::with_capacity(DEFAULT_CAPACITY, inner)
    }

    pub fn with_capacity(capacity: usize, inner: W) -> Self {
        Bytes(io::BufWriter::with_capacity(capacity, inner))
    }

    pub fn get_ref(&self) -> &W {
        self.0.get_ref()
    }

    /// Flush buffered characters and return the underlying stream.
    pub fn into_inner(self) -> io::Result<W> {
        self.0.into_inner().map_err(io::IntoInnerError::into_error)
    }
}

impl<W: io::Write> Sink for Bytes<W> {
    fn put(&mut self, chars: &[u8]) -> io::Result<()> {
        io::Write::write_all(&mut self.0, chars)
    }

    fn flush(&mut self) -> io::Result<()> {
        io::Write::flush(&mut self.0)
    }
}

/// Character stream sink.
#[derive(Debug)]
pub struct Chars<W: fmt::Write>(W);

impl<W: fmt::Write> Chars<W> {
    pub fn new(inner: W) -> Self {
        Chars(inner)
    }

    pub fn get_ref(&self) -> &W {
        &self.0
    }

    pub fn into_inner(self) -> W {
        self.0
    }
}

impl<W: fmt::Write> Sink for Chars<W> {
    fn put(&mut self, chars: &[u8]) -> io::Result<()> {
        let chars = str::from_utf8(chars).expect("[UNREACHABLE]: base64 output is ASCII");
        self.0.write_str(chars).map_err(|_| {
            io::Error::new(io::ErrorKind::Other, "Failed to write to character stream")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_buffers_until_flush() -> io::Result<()> {
        let mut sink = Bytes::with_capacity(16, Vec::new());
        sink.put(b"TWFu")?;
        assert!(sink.get_ref().is_empty());
        Sink::flush(&mut sink)?;
        assert_eq!(sink.get_ref(), b"TWFu");
        Ok(())
    }

    #[test]
    fn chars_forwards_to_writer() -> io::Result<()> {
        let mut sink = Chars::new(String::new());
        sink.put(b"TQ==")?;
        assert_eq!(sink.into_inner(), "TQ==");
        Ok(())
    }
}
