//! # AES-256-GCM Payload Encryption (opt-in)
//!
//! The hardened alternative to [`Aes256Cbc`](super::symmetric::Aes256Cbc).
//! The default envelope is CBC without a MAC, which means the padding check
//! is the only thing standing between a flipped bit and a silently wrong
//! plaintext. GCM fixes that: any modification of the nonce, ciphertext or
//! tag fails authentication.
//!
//! This is not the default, and envelopes sealed with it are not readable by
//! a CBC opener (there's no algorithm identifier on the wire). Pick one per
//! deployment and stick with it:
//!
//! ```
//! use courier_protocol::crypto::aead::Aes256Gcm;
//! use courier_protocol::crypto::asymmetric::RsaPkcs1v15;
//! use courier_protocol::envelope::HybridEnvelope;
//!
//! let envelope = HybridEnvelope::with_symmetric(RsaPkcs1v15, Aes256Gcm);
//! # let _ = envelope;
//! ```
//!
//! ## Wire format
//!
//! `nonce(12) || ciphertext || tag(16)`. Nonces are random 96-bit values
//! from the OS CSPRNG. Each key encrypts exactly one payload, so the
//! birthday bound never comes into play.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Nonce,
};
use rand::rngs::OsRng;
use rand::RngCore;

use super::symmetric::{SymmetricCipher, SymmetricError, SymmetricKey};
use crate::config::{AEAD_ALGORITHM, AES_GCM_NONCE_LENGTH, AES_GCM_TAG_LENGTH};

/// Smallest well-formed GCM blob: nonce plus tag, empty plaintext.
pub const MIN_GCM_CIPHERTEXT_LENGTH: usize = AES_GCM_NONCE_LENGTH + AES_GCM_TAG_LENGTH;

/// AES-256-GCM payload cipher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Aes256Gcm;

impl SymmetricCipher for Aes256Gcm {
    fn algorithm(&self) -> &'static str {
        AEAD_ALGORITHM
    }

    fn encrypt(&self, payload: &[u8], key: &SymmetricKey) -> Result<Vec<u8>, SymmetricError> {
        let cipher = aes_gcm::Aes256Gcm::new_from_slice(key.as_bytes())
            .map_err(|_| SymmetricError::EncryptFailed)?;

        let mut nonce_bytes = [0u8; AES_GCM_NONCE_LENGTH];
        OsRng
            .try_fill_bytes(&mut nonce_bytes)
            .map_err(|_| SymmetricError::RandomSourceFailed)?;
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, payload)
            .map_err(|_| SymmetricError::EncryptFailed)?;

        let mut out = Vec::with_capacity(AES_GCM_NONCE_LENGTH + ciphertext.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    fn decrypt(&self, blob: &[u8], key: &SymmetricKey) -> Result<Vec<u8>, SymmetricError> {
        if blob.len() < MIN_GCM_CIPHERTEXT_LENGTH {
            return Err(SymmetricError::MalformedCiphertext { len: blob.len() });
        }

        let (nonce_bytes, ciphertext) = blob.split_at(AES_GCM_NONCE_LENGTH);
        let cipher = aes_gcm::Aes256Gcm::new_from_slice(key.as_bytes())
            .map_err(|_| SymmetricError::AuthenticationFailed)?;
        let nonce = Nonce::from_slice(nonce_bytes);

        // The aead crate only releases plaintext after the tag verifies, so
        // there's nothing to wipe on the failure path.
        cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| SymmetricError::AuthenticationFailed)
    }
}
