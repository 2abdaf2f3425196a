use rsa::{
    traits::{PrivateKeyParts, PublicKeyParts},
    BigUint, Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey,
};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// Key size used for signing identities unless configured otherwise
pub const DEFAULT_KEY_BITS: usize = 2048;

/// Public exponent produced by key generation
pub const DEFAULT_PUBLIC_EXPONENT: u32 = 65537;

pub struct Rsa {
    pub inner: RsaPrivateKey,
}

impl From<RsaPrivateKey> for Rsa {
    fn from(value: RsaPrivateKey) -> Self {
        Self { inner: value }
    }
}

impl Rsa {
    /// Generate a new RSA key pair with the given modulus length in bits
    pub fn generate(bits: usize) -> Result<Self> {
        let mut rng = rand::thread_rng();
        let private_key = RsaPrivateKey::new(&mut rng, bits)
            .map_err(|e| Error::Other(format!("Failed to generate RSA key: {}", e)))?;
        Ok(private_key.into())
    }

    /// Rebuild a private key from big-endian modulus and exponents.
    ///
    /// Persisted private halves only carry the modulus and the private
    /// exponent; the primes are recovered from `(n, e, d)`.
    pub fn from_components(
        modulus: &[u8],
        public_exponent: &[u8],
        private_exponent: &[u8],
    ) -> Result<Self> {
        if modulus.is_empty() || public_exponent.is_empty() || private_exponent.is_empty() {
            return Err(Error::InvalidComponents(
                "modulus and exponents must not be empty".to_string(),
            ));
        }
        let n = BigUint::from_bytes_be(modulus);
        let e = BigUint::from_bytes_be(public_exponent);
        let d = BigUint::from_bytes_be(private_exponent);
        let private_key = RsaPrivateKey::from_components(n, e, d, Vec::new())
            .map_err(|e| Error::InvalidComponents(e.to_string()))?;
        Ok(private_key.into())
    }
}

impl Rsa {
    /// Get the public key for this keypair
    pub fn public_key(&self) -> RsaPublicKey {
        self.inner.to_public_key()
    }

    /// Big-endian modulus
    pub fn modulus(&self) -> Vec<u8> {
        self.inner.n().to_bytes_be()
    }

    /// Big-endian public exponent
    pub fn public_exponent(&self) -> Vec<u8> {
        self.inner.e().to_bytes_be()
    }

    /// Big-endian private exponent
    pub fn private_exponent(&self) -> Vec<u8> {
        self.inner.d().to_bytes_be()
    }

    /// Sign data using PKCS#1 v1.5 with SHA-256
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        let mut rng = rand::thread_rng();
        let hashed = Sha256::digest(message);
        let signature = self
            .inner
            .sign_with_rng(&mut rng, Pkcs1v15Sign::new::<Sha256>(), &hashed)
            .map_err(|e| Error::Other(format!("RSA signing failed: {}", e)))?;
        Ok(signature)
    }
}

/// Build a public key from big-endian modulus and public exponent
pub fn public_key_from_components(modulus: &[u8], exponent: &[u8]) -> Result<RsaPublicKey> {
    if modulus.is_empty() || exponent.is_empty() {
        return Err(Error::InvalidComponents(
            "modulus and exponent must not be empty".to_string(),
        ));
    }
    let n = BigUint::from_bytes_be(modulus);
    let e = BigUint::from_bytes_be(exponent);
    RsaPublicKey::new(n, e).map_err(Into::into)
}

/// Verify a PKCS#1 v1.5 / SHA-256 signature. Any failure is a plain `false`.
pub fn verify_signature(public_key: &RsaPublicKey, message: &[u8], signature: &[u8]) -> bool {
    let hashed = Sha256::digest(message);
    public_key
        .verify(Pkcs1v15Sign::new::<Sha256>(), &hashed, signature)
        .is_ok()
}
