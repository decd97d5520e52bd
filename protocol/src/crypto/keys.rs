//! # Recipient Key Management
//!
//! RSA keypair generation and PEM serialization for envelope recipients.
//!
//! Strictly speaking the envelope doesn't care where keys come from: it
//! takes an `RsaPublicKey` to seal and an `RsaPrivateKey` to open. This
//! module is the boring plumbing around that: make a keypair, write it to
//! PEM, read it back.
//!
//! ## Security considerations
//!
//! - Generation uses `OsRng`. If your OS RNG is broken, envelopes are the
//!   least of your worries.
//! - The generator refuses moduli below [`MIN_RSA_BITS`]. Imported keys are
//!   not policed beyond what the envelope needs (enough capacity to wrap a
//!   32-byte key).
//! - Private key PEM comes back wrapped in `Zeroizing`. Key bytes are never
//!   logged. If you add logging to this module, you will be asked to leave.

use std::fmt;

use rand::rngs::OsRng;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use thiserror::Error;
use zeroize::Zeroizing;

use crate::config::MIN_RSA_BITS;

/// Errors that can occur during key operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("refusing to generate a {bits}-bit key: minimum is {min} bits")]
    KeySizeTooSmall { bits: usize, min: usize },

    #[error("key generation failed: {0}")]
    Generation(String),

    #[error("invalid PEM key: {0}")]
    InvalidPem(String),

    #[error("key encoding failed: {0}")]
    Encoding(String),
}

/// Generate a fresh RSA keypair of `bits` modulus bits.
///
/// This is the `generate_keypair(bits)` capability envelopes are sealed
/// against. Returns `(public, private)`.
pub fn generate_keypair(bits: usize) -> Result<(RsaPublicKey, RsaPrivateKey), KeyError> {
    let keypair = RecipientKeypair::generate(bits)?;
    Ok((keypair.public, keypair.private))
}

/// An RSA keypair belonging to an envelope recipient.
///
/// Deliberately not `Serialize`. Writing a private key somewhere should be
/// a conscious act, so use [`private_key_pem`](Self::private_key_pem).
#[derive(Clone)]
pub struct RecipientKeypair {
    private: RsaPrivateKey,
    public: RsaPublicKey,
}

impl RecipientKeypair {
    /// Generate a fresh keypair. Expect this to take a while at 4096 bits.
    pub fn generate(bits: usize) -> Result<Self, KeyError> {
        if bits < MIN_RSA_BITS {
            return Err(KeyError::KeySizeTooSmall {
                bits,
                min: MIN_RSA_BITS,
            });
        }

        let private =
            RsaPrivateKey::new(&mut OsRng, bits).map_err(|e| KeyError::Generation(e.to_string()))?;
        tracing::debug!(bits, "generated recipient keypair");
        Ok(Self::from_private_key(private))
    }

    /// Wrap an existing private key, deriving the public half.
    pub fn from_private_key(private: RsaPrivateKey) -> Self {
        let public = private.to_public_key();
        Self { private, public }
    }

    /// Load a private key from PEM. Accepts PKCS#8 (`BEGIN PRIVATE KEY`)
    /// and PKCS#1 (`BEGIN RSA PRIVATE KEY`).
    pub fn from_private_key_pem(pem: &str) -> Result<Self, KeyError> {
        let private = RsaPrivateKey::from_pkcs8_pem(pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
            .map_err(|e| KeyError::InvalidPem(e.to_string()))?;
        Ok(Self::from_private_key(private))
    }

    /// The shareable half.
    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public
    }

    /// The half that never leaves the recipient.
    pub fn private_key(&self) -> &RsaPrivateKey {
        &self.private
    }

    /// Modulus size in bits.
    pub fn bits(&self) -> usize {
        self.public.size() * 8
    }

    /// PKCS#8 PEM of the private key. Wiped on drop.
    pub fn private_key_pem(&self) -> Result<Zeroizing<String>, KeyError> {
        self.private
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| KeyError::Encoding(e.to_string()))
    }

    /// SPKI PEM (`BEGIN PUBLIC KEY`) of the public key.
    pub fn public_key_pem(&self) -> Result<String, KeyError> {
        public_key_to_pem(&self.public)
    }
}

impl fmt::Debug for RecipientKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecipientKeypair")
            .field("bits", &self.bits())
            .field("private", &"<redacted>")
            .finish()
    }
}

/// Parse a public key from PEM. Accepts SPKI (`BEGIN PUBLIC KEY`) and
/// PKCS#1 (`BEGIN RSA PUBLIC KEY`).
pub fn public_key_from_pem(pem: &str) -> Result<RsaPublicKey, KeyError> {
    RsaPublicKey::from_public_key_pem(pem)
        .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
        .map_err(|e| KeyError::InvalidPem(e.to_string()))
}

/// Encode a public key as SPKI PEM.
pub fn public_key_to_pem(key: &RsaPublicKey) -> Result<String, KeyError> {
    key.to_public_key_pem(LineEnding::LF)
        .map_err(|e| KeyError::Encoding(e.to_string()))
}

/// Shared keypairs for tests. 2048-bit generation isn't free, so every test
/// in the crate reuses the same two.
#[cfg(test)]
pub(crate) mod test_support {
    use super::RecipientKeypair;
    use crate::config::DEFAULT_RSA_BITS;
    use std::sync::OnceLock;

    pub(crate) fn recipient() -> &'static RecipientKeypair {
        static KEY: OnceLock<RecipientKeypair> = OnceLock::new();
        KEY.get_or_init(|| RecipientKeypair::generate(DEFAULT_RSA_BITS).unwrap())
    }

    pub(crate) fn stranger() -> &'static RecipientKeypair {
        static KEY: OnceLock<RecipientKeypair> = OnceLock::new();
        KEY.get_or_init(|| RecipientKeypair::generate(DEFAULT_RSA_BITS).unwrap())
    }
}
