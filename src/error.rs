use std::io;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Operation is not legal in the blob's or codec's current state.
    #[error("Invalid state: {0}")]
    InvalidState(&'static str),

    #[error(transparent)]
    Io(#[from] io::Error),

    /// Decoder found input it cannot interpret as base64.
    #[error("Invalid base64 encoding at offset {offset}: {reason}")]
    InvalidEncoding { offset: u64, reason: String },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<Error> for io::Error {
    fn from(error: Error) -> Self {
        match error {
            Error::Io(error) => error,
            error @ Error::InvalidEncoding { .. } => io::Error::new(io::ErrorKind::InvalidData, error),
            error @ Error::Config(_) => io::Error::new(io::ErrorKind::InvalidInput, error),
            error @ Error::InvalidState(_) => io::Error::new(io::ErrorKind::Other, error),
        }
    }
}

#[test]
fn io_roundtrip_preserves_kind() {
    let error = io::Error::from(Error::InvalidState("write after commit"));
    assert_eq!(error.kind(), io::ErrorKind::Other);
    assert_eq!(error.to_string(), "Invalid state: write after commit");

    let error = io::Error::from(Error::Io(io::Error::new(io::ErrorKind::NotFound, "gone")));
    assert_eq!(error.kind(), io::ErrorKind::NotFound);
}
