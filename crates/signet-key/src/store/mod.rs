mod file;
mod memory;

pub use file::FileKeyStore;
pub use memory::MemoryKeyStore;

use crate::error::Result;
use crate::key::{KeyArtifact, KeyHalf};

/// Trait for key storage backends (synchronous)
///
/// Artifacts are addressed by exact identity name inside one of the two
/// namespaces. Implementations must never match by prefix or pattern.
pub trait KeyStore: Send + Sync {
    /// Store an artifact, replacing any previous one
    fn write(&self, identity: &str, half: KeyHalf, artifact: &KeyArtifact) -> Result<()>;

    /// Read an artifact; `Ok(None)` when it does not exist
    fn read(&self, identity: &str, half: KeyHalf) -> Result<Option<KeyArtifact>>;

    /// Check if an artifact exists
    fn exists(&self, identity: &str, half: KeyHalf) -> Result<bool>;

    /// Delete both halves of an identity
    fn delete(&self, identity: &str) -> Result<()>;

    /// List identities present in a namespace, sorted
    fn list(&self, half: KeyHalf) -> Result<Vec<String>>;
}

/// Key storage configuration
#[derive(Clone, Debug)]
pub enum KeyStoreConfig {
    Memory,
    File { path: std::path::PathBuf },
}

/// Factory function to create a key store based on configuration
pub fn create_key_store(config: KeyStoreConfig) -> Result<Box<dyn KeyStore>> {
    match config {
        KeyStoreConfig::Memory => Ok(Box::new(MemoryKeyStore::new())),
        KeyStoreConfig::File { path } => Ok(Box::new(FileKeyStore::new(path)?)),
    }
}
