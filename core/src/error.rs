pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported document type: {0}")]
    UnsupportedDocument(String),

    #[error("cannot read document {name}: {reason}")]
    UnreadableDocument { name: String, reason: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("stored index is corrupt: {0}")]
    Corrupt(String),

    #[error("stored index has format version {found}, expected {expected}")]
    IncompatibleVersion { found: u32, expected: u32 },

    #[error("failed to encode index: {0}")]
    Encode(#[source] bincode::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },
}

impl Error {
    /// Errors caused by the caller's input rather than by the system.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Error::UnsupportedDocument(_) | Error::UnreadableDocument { .. } | Error::InvalidInput(_))
    }
}
