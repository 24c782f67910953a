use std::fs;
use std::io;
use std::io::Write as _;
use std::path;

use structopt::StructOpt;

use crate::base64;
use crate::Blob as _;
use crate::OverflowBlob;
use crate::WritableBlob as _;

/// Decode base64 input back to binary.
#[derive(StructOpt)]
pub struct Configuration {
    /// File to decode.
    ///
    /// Default to standard input if not provided.
    input: Option<path::PathBuf>,

    #[structopt(flatten)]
    buffer: super::Buffer,
}

impl Configuration {
    pub fn run(self) -> anyhow::Result<()> {
        let mut blob = OverflowBlob::new(self.buffer.config())?;

        let stream = blob.open_output_stream()?;
        let mut decoder = base64::Decoder::new(stream);

        match &self.input {
            None => {
                let stdin = io::stdin();
                let mut stdin = stdin.lock();
                io::copy(&mut stdin, &mut decoder)?;
            }
            Some(path) => {
                let mut file = fs::File::open(path)?;
                io::copy(&mut file, &mut decoder)?;
            }
        }

        decoder.finish()?.close()?;

        log::info!(
            "Decoded {} bytes {}",
            blob.len(),
            if blob.is_spilled() { "on disk" } else { "in memory" },
        );

        let stdout = io::stdout();
        let mut stdout = stdout.lock();
        blob.write_to(&mut stdout)?;
        stdout.flush()?;

        blob.release()?;
        Ok(())
    }
}
