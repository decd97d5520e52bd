//! # RSA Key Wrapping
//!
//! The asymmetric half of the hybrid scheme. RSA never touches the message
//! itself: it encrypts the 32-byte AES key, which is all it is good for.
//!
//! [`AsymmetricCipher`] is the seam. The envelope only knows that a
//! backend can tell it how much plaintext a public key can carry, encrypt
//! that much under the public key, and decrypt it again under the private
//! key. Two RSA backends ship with the crate:
//!
//! - [`RsaPkcs1v15`] -- PKCS#1 v1.5 encryption padding. The default, since
//!   that's what existing peers speak. Capacity is `k - 11` bytes for a
//!   `k`-byte modulus.
//! - [`RsaOaep`] -- OAEP with SHA-256. Capacity is `k - 66` bytes.
//!
//! ## A note on PKCS#1 v1.5
//!
//! v1.5 decryption is the textbook Bleichenbacher target, and the `rsa`
//! crate's private-key operation is not constant time (RUSTSEC-2023-0071).
//! Don't expose [`RsaPkcs1v15::decrypt`] as an oracle to untrusted callers
//! who can observe timing. New deployments should prefer OAEP.

use rand::rngs::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::config::{
    oaep_sha256_capacity, pkcs1v15_capacity, KEY_WRAP_ALGORITHM, KEY_WRAP_ALGORITHM_OAEP,
};

/// Errors from the key-wrap layer.
///
/// Decryption failures are intentionally lumped together. Whether the key
/// was wrong or the wrapped blob was mangled is none of an attacker's
/// business.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyWrapError {
    #[error("key of {key_len} bytes exceeds the recipient key's wrap capacity of {capacity} bytes")]
    KeyTooLarge { key_len: usize, capacity: usize },

    #[error("key unwrap failed -- wrong private key or corrupted wrapped key")]
    DecryptFailed,

    #[error("key wrap failed: {0}")]
    EncryptFailed(String),
}

/// A public-key cipher that can wrap short secrets.
pub trait AsymmetricCipher {
    /// Key the sender encrypts to.
    type PublicKey;
    /// Key the recipient decrypts with. Never logged, never transmitted.
    type PrivateKey;

    /// Human-readable algorithm name, for logs.
    fn algorithm(&self) -> &'static str;

    /// Largest plaintext, in bytes, that `public_key` can wrap.
    fn capacity(&self, public_key: &Self::PublicKey) -> usize;

    /// Wrap `plaintext` under `public_key`.
    ///
    /// Fails with [`KeyWrapError::KeyTooLarge`] before doing any work if
    /// `plaintext` exceeds [`capacity`](Self::capacity).
    fn encrypt(
        &self,
        plaintext: &[u8],
        public_key: &Self::PublicKey,
    ) -> Result<Vec<u8>, KeyWrapError>;

    /// Unwrap `ciphertext` under `private_key`. The recovered bytes are
    /// wiped when the returned buffer drops.
    fn decrypt(
        &self,
        ciphertext: &[u8],
        private_key: &Self::PrivateKey,
    ) -> Result<Zeroizing<Vec<u8>>, KeyWrapError>;
}

fn ensure_fits(len: usize, capacity: usize) -> Result<(), KeyWrapError> {
    if len > capacity {
        return Err(KeyWrapError::KeyTooLarge {
            key_len: len,
            capacity,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// PKCS#1 v1.5
// ---------------------------------------------------------------------------

/// RSA encryption with PKCS#1 v1.5 padding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RsaPkcs1v15;

impl AsymmetricCipher for RsaPkcs1v15 {
    type PublicKey = RsaPublicKey;
    type PrivateKey = RsaPrivateKey;

    fn algorithm(&self) -> &'static str {
        KEY_WRAP_ALGORITHM
    }

    fn capacity(&self, public_key: &RsaPublicKey) -> usize {
        pkcs1v15_capacity(public_key.size())
    }

    fn encrypt(&self, plaintext: &[u8], public_key: &RsaPublicKey) -> Result<Vec<u8>, KeyWrapError> {
        ensure_fits(plaintext.len(), self.capacity(public_key))?;
        public_key
            .encrypt(&mut OsRng, Pkcs1v15Encrypt, plaintext)
            .map_err(|e| KeyWrapError::EncryptFailed(e.to_string()))
    }

    fn decrypt(
        &self,
        ciphertext: &[u8],
        private_key: &RsaPrivateKey,
    ) -> Result<Zeroizing<Vec<u8>>, KeyWrapError> {
        private_key
            .decrypt(Pkcs1v15Encrypt, ciphertext)
            .map(Zeroizing::new)
            .map_err(|_| KeyWrapError::DecryptFailed)
    }
}

// ---------------------------------------------------------------------------
// OAEP (SHA-256)
// ---------------------------------------------------------------------------

/// RSA encryption with OAEP padding, SHA-256 for both the label hash and
/// MGF1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RsaOaep;

impl AsymmetricCipher for RsaOaep {
    type PublicKey = RsaPublicKey;
    type PrivateKey = RsaPrivateKey;

    fn algorithm(&self) -> &'static str {
        KEY_WRAP_ALGORITHM_OAEP
    }

    fn capacity(&self, public_key: &RsaPublicKey) -> usize {
        oaep_sha256_capacity(public_key.size())
    }

    fn encrypt(&self, plaintext: &[u8], public_key: &RsaPublicKey) -> Result<Vec<u8>, KeyWrapError> {
        ensure_fits(plaintext.len(), self.capacity(public_key))?;
        public_key
            .encrypt(&mut OsRng, Oaep::new::<Sha256>(), plaintext)
            .map_err(|e| KeyWrapError::EncryptFailed(e.to_string()))
    }

    fn decrypt(
        &self,
        ciphertext: &[u8],
        private_key: &RsaPrivateKey,
    ) -> Result<Zeroizing<Vec<u8>>, KeyWrapError> {
        private_key
            .decrypt(Oaep::new::<Sha256>(), ciphertext)
            .map(Zeroizing::new)
            .map_err(|_| KeyWrapError::DecryptFailed)
    }
}
