use thiserror::Error;

/// Crate-wide error type
#[derive(Debug, Error)]
pub enum Error {
    /// Driver failure, carried through unchanged.
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("Invalid connection URI: {0}")]
    InvalidUri(String),

    #[error("Not connected to MongoDB")]
    NotConnected,

    #[error("No default model configured for this store")]
    NoModel,

    #[error("Timeout: {0}")]
    Timeout(String),
}

impl Error {
    /// The underlying driver error, if this failure came from the driver.
    pub fn as_mongo(&self) -> Option<&mongodb::error::Error> {
        match self {
            Error::Mongo(err) => Some(err),
            _ => None,
        }
    }
}

/// Convenience Result type using our Error
pub type Result<T> = std::result::Result<T, Error>;
