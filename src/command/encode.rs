use std::fs;
use std::io;
use std::io::Write as _;
use std::path;

use structopt::StructOpt;

use crate::base64;
use crate::Blob as _;
use crate::OverflowBlob;
use crate::WritableBlob as _;

/// Encode binary input as base64.
#[derive(StructOpt)]
pub struct Configuration {
    /// File to encode.
    ///
    /// Default to standard input if not provided.
    input: Option<path::PathBuf>,

    #[structopt(flatten)]
    buffer: super::Buffer,
}

impl Configuration {
    pub fn run(self) -> anyhow::Result<()> {
        let mut blob = OverflowBlob::new(self.buffer.config())?;

        match &self.input {
            None => {
                let stdin = io::stdin();
                let mut stdin = stdin.lock();
                blob.read_from_auto(&mut stdin, None)?;
            }
            Some(path) => {
                let mut file = fs::File::open(path)?;
                blob.read_from_auto(&mut file, None)?;
            }
        }

        log::info!(
            "Buffered {} bytes {}",
            blob.len(),
            if blob.is_spilled() { "on disk" } else { "in memory" },
        );

        let stdout = io::stdout();
        let mut encoder = base64::Encoder::new(base64::Bytes::new(stdout.lock()));
        blob.write_to(&mut encoder)?;

        let mut stdout = encoder.finish()?.into_inner()?;
        stdout.write_all(b"\n")?;
        stdout.flush()?;

        blob.release()?;
        Ok(())
    }
}
