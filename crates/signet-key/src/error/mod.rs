mod store;

use thiserror::Error;

/// Key management error type
#[derive(Error, Debug)]
pub enum Error {
    /// No artifact exists for the requested identity
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Key material exists but cannot serve the requested role
    #[error("Key unavailable: {0}")]
    KeyUnavailable(String),

    /// Identity name that cannot address a key artifact
    #[error("Invalid identity: {0:?}")]
    InvalidIdentity(String),

    /// Key pair generation failed
    #[error("Key generation error: {0}")]
    GenerationError(String),

    /// Encoding/decoding error
    #[error("Encoding error: {0}")]
    EncodingError(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Crypto error: {0}")]
    CryptoError(#[from] signet_crypto::Error),

    /// Other error
    #[error("Other error: {0}")]
    Other(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
