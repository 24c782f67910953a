pub mod base64;
pub mod blob;
pub mod command;
pub mod error;

mod file;
mod util;

pub use blob::Blob;
pub use blob::MemoryBlob;
pub use blob::OverflowBlob;
pub use blob::State;
pub use blob::WritableBlob;
pub use error::Error;
pub use error::Result;
