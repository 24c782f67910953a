use std::cmp;
use std::io;

use crate::base64;
use crate::base64::Sink;
use crate::Error;

/// Streaming base64 encoder.
///
/// Bytes are encoded as soon as a complete 3-byte group is available; up to
/// two bytes are carried over between calls. Call [`complete`](Encoder::complete),
/// [`close`](Encoder::close), or [`finish`](Encoder::finish) to emit the padded
/// final group.
#[derive(Debug)]
pub struct Encoder<S> {
    sink: S,
    carry: [u8; 3],
    pending: usize,
    completed: bool,
}

impl<S: Sink> Encoder<S> {
    pub fn new(sink: S) -> Self {
        Encoder {
            sink,
            carry: [0; 3],
            pending: 0,
            completed: false,
        }
    }

    pub fn get_ref(&self) -> &S {
        &self.sink
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn write(&mut self, mut data: &[u8]) -> io::Result<()> {
        if self.completed {
            return Err(Error::InvalidState("write after base64 stream was completed").into());
        }

        if self.pending > 0 {
            let count = cmp::min(3 - self.pending, data.len());
            self.carry[self.pending..self.pending + count].copy_from_slice(&data[..count]);
            self.pending += count;
            data = &data[count..];

            if self.pending < 3 {
                return Ok(());
            }

            self.pending = 0;
            self.sink.put(&base64::encode_group(&self.carry))?;
        }

        let mut groups = data.chunks_exact(3);
        for group in &mut groups {
            self.sink.put(&base64::encode_group(group))?;
        }

        let rest = groups.remainder();
        self.carry[..rest.len()].copy_from_slice(rest);
        self.pending = rest.len();
        Ok(())
    }

    /// Emit the final, padded group. Further writes fail.
    pub fn complete(&mut self) -> io::Result<()> {
        if self.completed {
            return Ok(());
        }
        self.completed = true;

        if self.pending > 0 {
            let pending = self.pending;
            self.pending = 0;
            self.sink.put(&base64::encode_tail(&self.carry[..pending]))?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.sink.flush()
    }

    pub fn close(&mut self) -> io::Result<()> {
        self.complete()?;
        self.sink.close()
    }

    /// Complete the stream and return the sink.
    pub fn finish(mut self) -> io::Result<S> {
        self.complete()?;
        self.sink.flush()?;
        Ok(self.sink)
    }
}

impl<S: Sink> io::Write for Encoder<S> {
    fn write(&mut self, buffer: &[u8]) -> io::Result<usize> {
        Encoder::write(self, buffer)?;
        Ok(buffer.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Encoder::flush(self)
    }
}
