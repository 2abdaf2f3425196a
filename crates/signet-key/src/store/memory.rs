use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use super::KeyStore;
use crate::error::{Error, Result};
use crate::key::{validate_identity, KeyArtifact, KeyHalf};

/// Type alias for the key storage map
type KeyStorage = Arc<RwLock<HashMap<(KeyHalf, String), KeyArtifact>>>;

/// In-memory key store implementation
pub struct MemoryKeyStore {
    keys: KeyStorage,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self {
            keys: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for MemoryKeyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyStore for MemoryKeyStore {
    fn write(&self, identity: &str, half: KeyHalf, artifact: &KeyArtifact) -> Result<()> {
        validate_identity(identity)?;
        let mut keys = self
            .keys
            .write()
            .map_err(|_| Error::lock_error("Failed to acquire write lock"))?;

        keys.insert((half, identity.to_string()), artifact.clone());
        Ok(())
    }

    fn read(&self, identity: &str, half: KeyHalf) -> Result<Option<KeyArtifact>> {
        validate_identity(identity)?;
        let keys = self
            .keys
            .read()
            .map_err(|_| Error::lock_error("Failed to acquire read lock"))?;

        Ok(keys.get(&(half, identity.to_string())).cloned())
    }

    fn exists(&self, identity: &str, half: KeyHalf) -> Result<bool> {
        validate_identity(identity)?;
        let keys = self
            .keys
            .read()
            .map_err(|_| Error::lock_error("Failed to acquire read lock"))?;

        Ok(keys.contains_key(&(half, identity.to_string())))
    }

    fn delete(&self, identity: &str) -> Result<()> {
        validate_identity(identity)?;
        let mut keys = self
            .keys
            .write()
            .map_err(|_| Error::lock_error("Failed to acquire write lock"))?;

        let public = keys.remove(&(KeyHalf::Public, identity.to_string()));
        let private = keys.remove(&(KeyHalf::Private, identity.to_string()));
        if public.is_none() && private.is_none() {
            return Err(Error::identity_not_found(identity));
        }
        Ok(())
    }

    fn list(&self, half: KeyHalf) -> Result<Vec<String>> {
        let keys = self
            .keys
            .read()
            .map_err(|_| Error::lock_error("Failed to acquire read lock"))?;

        let mut identities: Vec<String> = keys
            .keys()
            .filter(|(h, _)| *h == half)
            .map(|(_, identity)| identity.clone())
            .collect();
        identities.sort();
        Ok(identities)
    }
}
