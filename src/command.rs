mod decode;
mod encode;

use std::path;

use structopt::StructOpt;

use crate::blob;
use crate::util::Tap as _;

pub use decode::Configuration as Decode;
pub use encode::Configuration as Encode;

/// Buffering options shared by every command.
#[derive(Debug, StructOpt)]
pub struct Buffer {
    /// Number of in-memory chunks kept before spilling to disk.
    #[structopt(long, env = "SPILL_CHUNKS", default_value = "16")]
    chunks: usize,

    /// Size of each in-memory chunk in bytes.
    #[structopt(long, env = "SPILL_CHUNK_SIZE", default_value = "4096")]
    chunk_size: usize,

    /// Directory for the spill file.
    ///
    /// Default to the system temporary directory if not provided.
    #[structopt(long, env = "SPILL_TEMP_DIR")]
    temp_dir: Option<path::PathBuf>,
}

impl Buffer {
    fn config(&self) -> blob::Config {
        blob::Config::new(self.chunks, self.chunk_size).tap_mut(|config| {
            if let Some(directory) = &self.temp_dir {
                config.directory = directory.clone();
            }
        })
    }
}
