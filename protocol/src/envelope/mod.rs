//! # Hybrid Envelopes
//!
//! Where the two halves meet. Sealing a message:
//!
//! 1. Draw a fresh 32-byte [`SymmetricKey`].
//! 2. Wrap it under the recipient's public key ([`AsymmetricCipher`]).
//! 3. Encrypt the message under it ([`SymmetricCipher`]).
//! 4. Drop the key (zeroized) and hand back `{wrapped_key, ciphertext}`.
//!
//! Opening runs the same steps backwards: unwrap the key with the private
//! key, decrypt the payload, drop the key.
//!
//! ## Failure model
//!
//! Every failure is terminal for the envelope in hand. Nothing is retried:
//! decrypting the same bytes with the same key twice gives the same answer.
//! Callers get a distinct [`EnvelopeError`] variant per failure mode and
//! never a partially decrypted payload.
//!
//! ## Integrity (or the lack of it)
//!
//! With the default [`Aes256Cbc`] payload cipher there is no authentication
//! tag. [`EnvelopeError::PaddingInvalid`] is the only tamper signal, and it
//! is probabilistic: most corruption of the final ciphertext blocks breaks
//! the padding, but a flip in an earlier block (or in the IV) produces a
//! valid envelope with a different plaintext. If the transport can't be
//! trusted to deliver bytes unmodified, build the envelope with
//! [`Aes256Gcm`](crate::crypto::Aes256Gcm) or add a signature on top.
//!
//! ## Concurrency
//!
//! A `HybridEnvelope` holds no mutable state. Share one across threads
//! freely; every call draws its own key and IV from `OsRng`.

mod sealed;

pub use sealed::SealedEnvelope;

use rsa::{RsaPrivateKey, RsaPublicKey};
use thiserror::Error;

use crate::config::AES_KEY_LENGTH;
use crate::crypto::asymmetric::{AsymmetricCipher, KeyWrapError, RsaPkcs1v15};
use crate::crypto::symmetric::{Aes256Cbc, SymmetricCipher, SymmetricError, SymmetricKey};

/// Everything that can go wrong sealing or opening an envelope.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    /// The recipient's key is too small to wrap a symmetric key. Use a
    /// bigger asymmetric key.
    #[error("symmetric key of {key_len} bytes does not fit the recipient key (capacity {capacity} bytes)")]
    KeyTooLarge { key_len: usize, capacity: usize },

    /// The wrapped key could not be recovered: wrong private key, corrupted
    /// wrapped key, or it decrypted to something that isn't a symmetric key.
    #[error("key unwrap failed -- wrong private key or corrupted wrapped key")]
    KeyUnwrapFailed,

    /// The ciphertext is not framed as `iv || whole blocks`.
    #[error("malformed ciphertext ({len} bytes)")]
    MalformedCiphertext { len: usize },

    /// Decryption produced invalid padding. The usual face of tampering or a
    /// mismatched key.
    #[error("invalid padding -- ciphertext corrupted or tampered with")]
    PaddingInvalid,

    /// The authenticated payload cipher rejected the tag.
    #[error("authentication failed -- ciphertext corrupted or tampered with")]
    AuthenticationFailed,

    /// A primitive failed for reasons unrelated to the input (RNG, backend).
    #[error("crypto backend error: {0}")]
    Backend(String),

    /// An envelope could not be encoded or decoded for transport.
    #[error("envelope encoding error: {0}")]
    Encoding(String),
}

impl From<SymmetricError> for EnvelopeError {
    fn from(err: SymmetricError) -> Self {
        match err {
            SymmetricError::MalformedCiphertext { len } => EnvelopeError::MalformedCiphertext { len },
            SymmetricError::PaddingInvalid => EnvelopeError::PaddingInvalid,
            SymmetricError::AuthenticationFailed => EnvelopeError::AuthenticationFailed,
            SymmetricError::InvalidKeyLength { .. } => EnvelopeError::KeyUnwrapFailed,
            SymmetricError::EncryptFailed | SymmetricError::RandomSourceFailed => {
                EnvelopeError::Backend(err.to_string())
            }
        }
    }
}

impl From<KeyWrapError> for EnvelopeError {
    fn from(err: KeyWrapError) -> Self {
        match err {
            KeyWrapError::KeyTooLarge { key_len, capacity } => {
                EnvelopeError::KeyTooLarge { key_len, capacity }
            }
            KeyWrapError::DecryptFailed => EnvelopeError::KeyUnwrapFailed,
            KeyWrapError::EncryptFailed(msg) => EnvelopeError::Backend(msg),
        }
    }
}

/// Seals and opens envelopes for one key-wrap backend and one payload
/// cipher.
///
/// # Examples
///
/// ```no_run
/// use courier_protocol::crypto::{generate_keypair, RsaPkcs1v15};
/// use courier_protocol::envelope::HybridEnvelope;
///
/// let (public, private) = generate_keypair(2048).unwrap();
/// let envelope = HybridEnvelope::new(RsaPkcs1v15);
///
/// let sealed = envelope.seal(b"meet me at the usual place", &public).unwrap();
/// let opened = envelope.open(&sealed, &private).unwrap();
/// assert_eq!(opened, b"meet me at the usual place");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HybridEnvelope<A, S = Aes256Cbc> {
    asymmetric: A,
    symmetric: S,
}

impl<A: AsymmetricCipher> HybridEnvelope<A, Aes256Cbc> {
    /// Envelope with the default AES-256-CBC payload cipher.
    pub fn new(asymmetric: A) -> Self {
        Self {
            asymmetric,
            symmetric: Aes256Cbc,
        }
    }
}

impl<A: AsymmetricCipher, S: SymmetricCipher> HybridEnvelope<A, S> {
    /// Envelope with an explicit payload cipher.
    pub fn with_symmetric(asymmetric: A, symmetric: S) -> Self {
        Self {
            asymmetric,
            symmetric,
        }
    }

    pub fn asymmetric(&self) -> &A {
        &self.asymmetric
    }

    pub fn symmetric(&self) -> &S {
        &self.symmetric
    }

    /// Seal `message` for the holder of the private half of `recipient`.
    ///
    /// # Errors
    ///
    /// - [`EnvelopeError::KeyTooLarge`] if the recipient key can't carry a
    ///   32-byte key. Checked before any key material is generated.
    /// - [`EnvelopeError::Backend`] if the RNG or a primitive fails.
    pub fn seal(
        &self,
        message: &[u8],
        recipient: &A::PublicKey,
    ) -> Result<SealedEnvelope, EnvelopeError> {
        let capacity = self.asymmetric.capacity(recipient);
        if AES_KEY_LENGTH > capacity {
            tracing::debug!(
                capacity,
                algorithm = self.asymmetric.algorithm(),
                "recipient key too small to wrap a symmetric key"
            );
            return Err(EnvelopeError::KeyTooLarge {
                key_len: AES_KEY_LENGTH,
                capacity,
            });
        }

        // `key` is wiped when it goes out of scope, including on the `?`
        // paths below.
        let key = SymmetricKey::generate()?;
        let wrapped_key = self.asymmetric.encrypt(key.as_bytes(), recipient)?;
        let ciphertext = self.symmetric.encrypt(message, &key)?;
        drop(key);

        tracing::debug!(
            message_len = message.len(),
            wrapped_key_len = wrapped_key.len(),
            ciphertext_len = ciphertext.len(),
            key_wrap = self.asymmetric.algorithm(),
            cipher = self.symmetric.algorithm(),
            "envelope sealed"
        );

        Ok(SealedEnvelope {
            wrapped_key,
            ciphertext,
        })
    }

    /// Open an envelope with the recipient's private key.
    ///
    /// # Errors
    ///
    /// - [`EnvelopeError::KeyUnwrapFailed`] for a wrong private key or a
    ///   mangled `wrapped_key`.
    /// - [`EnvelopeError::MalformedCiphertext`] / [`EnvelopeError::PaddingInvalid`]
    ///   (or [`EnvelopeError::AuthenticationFailed`] for GCM) from the
    ///   payload cipher.
    pub fn open(
        &self,
        envelope: &SealedEnvelope,
        recipient: &A::PrivateKey,
    ) -> Result<Vec<u8>, EnvelopeError> {
        let key = self.unwrap_key(&envelope.wrapped_key, recipient)?;

        let message = self
            .symmetric
            .decrypt(&envelope.ciphertext, &key)
            .map_err(|e| {
                tracing::debug!(error = %e, "envelope payload rejected");
                EnvelopeError::from(e)
            })?;
        drop(key);

        tracing::debug!(
            ciphertext_len = envelope.ciphertext.len(),
            message_len = message.len(),
            "envelope opened"
        );
        Ok(message)
    }

    fn unwrap_key(
        &self,
        wrapped_key: &[u8],
        recipient: &A::PrivateKey,
    ) -> Result<SymmetricKey, EnvelopeError> {
        // The intermediate buffer is `Zeroizing`, so both it and the final
        // key are wiped whichever way this returns.
        let unwrapped = self
            .asymmetric
            .decrypt(wrapped_key, recipient)
            .map_err(|e| {
                tracing::debug!(error = %e, "wrapped key rejected");
                EnvelopeError::KeyUnwrapFailed
            })?;

        SymmetricKey::from_slice(&unwrapped).map_err(|_| {
            tracing::debug!(
                unwrapped_len = unwrapped.len(),
                "wrapped key has the wrong length"
            );
            EnvelopeError::KeyUnwrapFailed
        })
    }
}

/// Seal with the defaults: RSA PKCS#1 v1.5 key wrap, AES-256-CBC payload.
pub fn seal(message: &[u8], recipient: &RsaPublicKey) -> Result<SealedEnvelope, EnvelopeError> {
    HybridEnvelope::new(RsaPkcs1v15).seal(message, recipient)
}

/// Open an envelope produced by [`seal`].
pub fn open(envelope: &SealedEnvelope, recipient: &RsaPrivateKey) -> Result<Vec<u8>, EnvelopeError> {
    HybridEnvelope::new(RsaPkcs1v15).open(envelope, recipient)
}
