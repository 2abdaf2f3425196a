use super::Error;
use crate::key::KeyHalf;

/// Storage-related error helpers
impl Error {
    /// No artifact for this identity in the given namespace
    pub fn key_not_found(identity: &str, half: KeyHalf) -> Self {
        Error::NotFound(format!("no {} key for {:?}", half, identity))
    }

    /// Neither half exists
    pub fn identity_not_found(identity: &str) -> Self {
        Error::NotFound(format!("no key pair for {:?}", identity))
    }

    /// Only the public half exists (imported key)
    pub fn private_key_unavailable(identity: &str) -> Self {
        Error::KeyUnavailable(format!(
            "{:?} only has a public key, it cannot be used for signing",
            identity
        ))
    }

    pub fn invalid_identity(identity: &str) -> Self {
        Error::InvalidIdentity(identity.to_string())
    }

    pub fn serialization(err: impl std::fmt::Display) -> Self {
        Error::EncodingError(format!("Serialization error: {}", err))
    }

    pub fn deserialization(err: impl std::fmt::Display) -> Self {
        Error::EncodingError(format!("Deserialization error: {}", err))
    }

    pub fn lock_error(msg: impl std::fmt::Display) -> Self {
        Error::Other(format!("Lock error: {}", msg))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::serialization(err)
    }
}
