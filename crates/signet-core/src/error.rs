//! Core error types

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum CoreError {
    /// No usable key material for the requested role
    #[error("Key unavailable: {0}")]
    KeyUnavailable(String),

    /// Signature missing, undecodable or not matching the content
    #[error("Signature invalid: {0}")]
    SignatureInvalid(String),

    /// Document content could not be parsed
    #[error("Parse failure: {0}")]
    ParseFailure(String),

    /// Key or record I/O failed
    #[error("Storage failure: {0}")]
    StorageFailure(String),

    /// Lazy key generation failed during an authoring action; the message is
    /// meant for the author
    #[error("{0}")]
    KeyGeneration(String),

    /// A document or user reference could not be resolved
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<signet_key::Error> for CoreError {
    fn from(err: signet_key::Error) -> Self {
        use signet_key::Error as KeyError;
        match err {
            KeyError::NotFound(msg) | KeyError::KeyUnavailable(msg) => CoreError::KeyUnavailable(msg),
            KeyError::InvalidIdentity(identity) => {
                CoreError::KeyUnavailable(format!("invalid key name {:?}", identity))
            }
            KeyError::GenerationError(msg) => CoreError::KeyGeneration(msg),
            KeyError::CryptoError(e) => CoreError::KeyUnavailable(format!("unusable key material: {}", e)),
            other @ (KeyError::IoError(_) | KeyError::EncodingError(_) | KeyError::Other(_)) => {
                CoreError::StorageFailure(other.to_string())
            }
        }
    }
}

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        CoreError::StorageFailure(err.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::StorageFailure(format!("record encoding: {}", err))
    }
}

impl From<toml::de::Error> for CoreError {
    fn from(err: toml::de::Error) -> Self {
        CoreError::Config(err.to_string())
    }
}

/// Core operation result type
pub type Result<T> = std::result::Result<T, CoreError>;
