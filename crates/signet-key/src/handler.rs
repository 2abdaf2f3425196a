//! Key pair lifecycle on top of a [`KeyStore`].

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use signet_crypto::{Rsa, RsaPublicKey, DEFAULT_KEY_BITS};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::key::{
    public_key_from_artifact, signing_key_from_artifacts, validate_identity, KeyArtifact, KeyHalf,
    KeyPairRecord,
};
use crate::store::KeyStore;

/// Generates, loads and imports per-identity RSA key pairs.
///
/// Generation for one identity is serialized so that two concurrent first
/// signings can never leave mismatched halves on disk.
pub struct KeyPairHandler {
    store: Arc<dyn KeyStore>,
    key_bits: usize,
    generation_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyPairHandler {
    pub fn new(store: Arc<dyn KeyStore>) -> Self {
        Self::with_key_bits(store, DEFAULT_KEY_BITS)
    }

    pub fn with_key_bits(store: Arc<dyn KeyStore>, key_bits: usize) -> Self {
        Self {
            store,
            key_bits,
            generation_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn key_bits(&self) -> usize {
        self.key_bits
    }

    pub fn store(&self) -> &Arc<dyn KeyStore> {
        &self.store
    }

    /// Run `f` while holding the write lock of `identity`.
    ///
    /// The lock's table entry is dropped again once no other caller holds it.
    fn with_identity_lock<T>(&self, identity: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let lock = {
            let mut locks = self
                .generation_locks
                .lock()
                .map_err(|_| Error::lock_error("generation lock table poisoned"))?;
            Arc::clone(
                locks
                    .entry(identity.to_string())
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };

        let result = match lock.lock() {
            Ok(_guard) => f(),
            Err(_) => Err(Error::lock_error("identity generation lock poisoned")),
        };

        if let Ok(mut locks) = self.generation_locks.lock() {
            // the table and `lock` are the only holders
            if Arc::strong_count(&lock) == 2 {
                locks.remove(identity);
            }
        }
        result
    }

    /// Generate a fresh key pair and persist both halves, replacing any
    /// existing artifacts for `identity`.
    pub fn generate_key_pair(&self, identity: &str) -> Result<()> {
        validate_identity(identity)?;
        self.with_identity_lock(identity, || self.generate_locked(identity))
    }

    fn generate_locked(&self, identity: &str) -> Result<()> {
        let record = KeyPairRecord::generate(identity, self.key_bits)?;
        self.store.write(identity, KeyHalf::Public, &record.public)?;
        if let Some(private) = &record.private {
            self.store.write(identity, KeyHalf::Private, private)?;
        }
        info!(identity, bits = self.key_bits, "generated key pair");
        Ok(())
    }

    /// Make sure `identity` can sign.
    ///
    /// Returns `true` when a new pair was generated. An identity holding only
    /// an imported public key is reported as unavailable and left untouched.
    pub fn ensure_key_pair(&self, identity: &str) -> Result<bool> {
        validate_identity(identity)?;
        self.with_identity_lock(identity, || {
            if self.store.exists(identity, KeyHalf::Private)? {
                return Ok(false);
            }
            if self.store.exists(identity, KeyHalf::Public)? {
                warn!(identity, "refusing to replace imported public key");
                return Err(Error::private_key_unavailable(identity));
            }
            self.generate_locked(identity)?;
            Ok(true)
        })
    }

    /// Load the verification key for `identity`
    pub fn public_key(&self, identity: &str) -> Result<RsaPublicKey> {
        let artifact = self
            .store
            .read(identity, KeyHalf::Public)?
            .ok_or_else(|| Error::key_not_found(identity, KeyHalf::Public))?;
        public_key_from_artifact(&artifact)
    }

    /// Load the signing key for `identity`
    pub fn private_key(&self, identity: &str) -> Result<Rsa> {
        let public = self.store.read(identity, KeyHalf::Public)?;
        let private = match self.store.read(identity, KeyHalf::Private)? {
            Some(private) => private,
            None if public.is_some() => return Err(Error::private_key_unavailable(identity)),
            None => return Err(Error::identity_not_found(identity)),
        };
        debug!(identity, "loaded signing key");
        signing_key_from_artifacts(&private, public.as_ref())
    }

    /// Register a third-party public key under `identity`
    pub fn import_public_key(&self, identity: &str, artifact: KeyArtifact) -> Result<()> {
        validate_identity(identity)?;
        public_key_from_artifact(&artifact)?;
        self.with_identity_lock(identity, || {
            self.store.write(identity, KeyHalf::Public, &artifact)?;
            info!(identity, bits = artifact.modulus_bits(), "imported public key");
            Ok(())
        })
    }

    pub fn has_private_key(&self, identity: &str) -> Result<bool> {
        self.store.exists(identity, KeyHalf::Private)
    }

    /// Both stored halves of `identity`
    pub fn key_pair(&self, identity: &str) -> Result<KeyPairRecord> {
        let public = self
            .store
            .read(identity, KeyHalf::Public)?
            .ok_or_else(|| Error::key_not_found(identity, KeyHalf::Public))?;
        let private = self.store.read(identity, KeyHalf::Private)?;
        Ok(KeyPairRecord {
            identity: identity.to_string(),
            public,
            private,
        })
    }
}
