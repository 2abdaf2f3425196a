use thiserror::Error;

/// Error type for the crypto module
#[derive(Error, Debug)]
pub enum Error {
    #[error("RSA error: {0}")]
    RsaError(#[from] rsa::Error),

    #[error("Base64 error: {0}")]
    Base64Error(#[from] base64::DecodeError),

    /// Key components that cannot form a usable key
    #[error("Invalid key components: {0}")]
    InvalidComponents(String),

    #[error("Other error: {0}")]
    Other(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
