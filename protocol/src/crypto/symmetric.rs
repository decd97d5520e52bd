//! # AES-256-CBC Payload Encryption
//!
//! The bulk-data half of the hybrid scheme. Every sealed message gets a
//! fresh 256-bit key and a fresh 128-bit IV, and the payload is encrypted
//! with AES in CBC mode after PKCS#7 padding.
//!
//! ## Wire format
//!
//! [`encrypt`] returns `iv || ciphertext` as a single `Vec<u8>`. The first
//! 16 bytes are the IV, the rest is a whole number of 16-byte blocks. There
//! is no length field: PKCS#7 padding (N bytes of value N, 1 <= N <= 16)
//! tells the decryptor exactly how many bytes to strip.
//!
//! ## What this does NOT give you
//!
//! Integrity. CBC without a MAC is malleable: flip a bit in block `i` of the
//! ciphertext and the same bit flips in plaintext block `i + 1`, while block
//! `i` turns into garbage. The only tamper signal is the padding check on
//! the final block, which catches most random corruption and none of the
//! careful kind. Callers that need integrity should use the
//! [`Aes256Gcm`](super::aead::Aes256Gcm) backend instead.
//!
//! ## Memory
//!
//! Both directions work in one buffer the size of the output. Encryption
//! copies the payload once into the output vector and pads/encrypts in
//! place; decryption copies the body once and decrypts/unpads in place.

use std::fmt;

use aes::Aes256;
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::config::{AES_BLOCK_LENGTH, AES_KEY_LENGTH, CBC_IV_LENGTH, SYMMETRIC_ALGORITHM};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// A CBC initialization vector. One per encryption call, never reused.
pub type InitializationVector = [u8; CBC_IV_LENGTH];

/// Errors from the symmetric layer.
///
/// `MalformedCiphertext` and `PaddingInvalid` are deliberately separate:
/// the first is a framing problem you can see without the key, the second
/// only shows up after decryption.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SymmetricError {
    #[error("malformed ciphertext: {len} bytes is not an IV plus whole blocks")]
    MalformedCiphertext { len: usize },

    #[error("invalid padding -- wrong key or corrupted ciphertext")]
    PaddingInvalid,

    #[error("authentication failed -- wrong key or corrupted ciphertext")]
    AuthenticationFailed,

    #[error("invalid key length: expected {AES_KEY_LENGTH} bytes, got {actual}")]
    InvalidKeyLength { actual: usize },

    #[error("encryption failed")]
    EncryptFailed,

    #[error("secure random source failed")]
    RandomSourceFailed,
}

// ---------------------------------------------------------------------------
// SymmetricKey
// ---------------------------------------------------------------------------

/// A 256-bit payload key.
///
/// Lives for exactly one seal or open call. The bytes are wiped when the
/// value is dropped, on success and error paths alike, and the type has no
/// `Clone` so a copy can't quietly outlive the operation. `Debug` is
/// redacted.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey {
    bytes: [u8; AES_KEY_LENGTH],
}

impl SymmetricKey {
    /// Draw a fresh key from the OS CSPRNG.
    pub fn generate() -> Result<Self, SymmetricError> {
        let mut bytes = [0u8; AES_KEY_LENGTH];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|_| SymmetricError::RandomSourceFailed)?;
        Ok(Self { bytes })
    }

    /// Wrap existing key bytes. The caller's array is moved in; wipe any
    /// other copies yourself.
    pub fn from_bytes(bytes: [u8; AES_KEY_LENGTH]) -> Self {
        Self { bytes }
    }

    /// Build a key from a slice of unknown length, e.g. the output of an
    /// RSA unwrap.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, SymmetricError> {
        let bytes: [u8; AES_KEY_LENGTH] = bytes
            .try_into()
            .map_err(|_| SymmetricError::InvalidKeyLength {
                actual: bytes.len(),
            })?;
        Ok(Self { bytes })
    }

    /// Borrow the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; AES_KEY_LENGTH] {
        &self.bytes
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey(<redacted>)")
    }
}

// ---------------------------------------------------------------------------
// SymmetricCipher capability
// ---------------------------------------------------------------------------

/// A payload cipher the envelope can be built on.
///
/// Implementations must generate their own IV/nonce per call and embed it
/// in the returned blob; `decrypt` must never hand back partial plaintext.
pub trait SymmetricCipher {
    /// Human-readable algorithm name, for logs.
    fn algorithm(&self) -> &'static str;

    /// Encrypt `payload` under `key`, returning a self-describing blob.
    fn encrypt(&self, payload: &[u8], key: &SymmetricKey) -> Result<Vec<u8>, SymmetricError>;

    /// Reverse [`encrypt`](Self::encrypt).
    fn decrypt(&self, blob: &[u8], key: &SymmetricKey) -> Result<Vec<u8>, SymmetricError>;
}

/// AES-256-CBC with PKCS#7 padding. The default payload cipher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Aes256Cbc;

impl SymmetricCipher for Aes256Cbc {
    fn algorithm(&self) -> &'static str {
        SYMMETRIC_ALGORITHM
    }

    fn encrypt(&self, payload: &[u8], key: &SymmetricKey) -> Result<Vec<u8>, SymmetricError> {
        encrypt(payload, key)
    }

    fn decrypt(&self, blob: &[u8], key: &SymmetricKey) -> Result<Vec<u8>, SymmetricError> {
        decrypt(blob, key)
    }
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Length of `payload_len` bytes after PKCS#7 padding. Always strictly
/// greater than the input: a block-aligned payload gains a full block.
pub const fn padded_length(payload_len: usize) -> usize {
    (payload_len / AES_BLOCK_LENGTH + 1) * AES_BLOCK_LENGTH
}

/// Fresh random IV from the OS CSPRNG.
pub fn generate_iv() -> Result<InitializationVector, SymmetricError> {
    let mut iv = [0u8; CBC_IV_LENGTH];
    OsRng
        .try_fill_bytes(&mut iv)
        .map_err(|_| SymmetricError::RandomSourceFailed)?;
    Ok(iv)
}

/// Encrypt a payload with AES-256-CBC under a fresh random IV.
///
/// Returns `iv || ciphertext`. The output is always
/// `16 + padded_length(payload.len())` bytes, so the empty payload
/// produces 32 bytes.
///
/// # Example
///
/// ```
/// use courier_protocol::crypto::symmetric::{decrypt, encrypt, SymmetricKey};
///
/// let key = SymmetricKey::generate().unwrap();
/// let blob = encrypt(b"attack at dawn", &key).unwrap();
/// assert_eq!(blob.len(), 32);
/// assert_eq!(decrypt(&blob, &key).unwrap(), b"attack at dawn");
/// ```
pub fn encrypt(payload: &[u8], key: &SymmetricKey) -> Result<Vec<u8>, SymmetricError> {
    let iv = generate_iv()?;
    encrypt_with_iv(payload, key, &iv)
}

fn encrypt_with_iv(
    payload: &[u8],
    key: &SymmetricKey,
    iv: &InitializationVector,
) -> Result<Vec<u8>, SymmetricError> {
    let total = CBC_IV_LENGTH + padded_length(payload.len());

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(iv);
    out.extend_from_slice(payload);
    out.resize(total, 0);

    let cipher = Aes256CbcEnc::new_from_slices(key.as_bytes(), iv)
        .map_err(|_| SymmetricError::EncryptFailed)?;
    cipher
        .encrypt_padded_mut::<Pkcs7>(&mut out[CBC_IV_LENGTH..], payload.len())
        .map_err(|_| SymmetricError::EncryptFailed)?;

    tracing::trace!(
        payload_len = payload.len(),
        blob_len = out.len(),
        "cbc payload encrypted"
    );
    Ok(out)
}

/// Decrypt `iv || ciphertext` produced by [`encrypt`].
///
/// # Errors
///
/// - [`SymmetricError::MalformedCiphertext`] if the blob is shorter than one
///   IV plus one block, or the body is not block-aligned.
/// - [`SymmetricError::PaddingInvalid`] if the final block doesn't end in a
///   consistent PKCS#7 pattern. That is what a wrong key or a corrupted
///   final block usually looks like. The decrypted buffer is wiped before
///   the error is returned.
pub fn decrypt(blob: &[u8], key: &SymmetricKey) -> Result<Vec<u8>, SymmetricError> {
    if blob.len() < CBC_IV_LENGTH {
        return Err(SymmetricError::MalformedCiphertext { len: blob.len() });
    }

    let (iv, body) = blob.split_at(CBC_IV_LENGTH);
    if body.is_empty() || body.len() % AES_BLOCK_LENGTH != 0 {
        return Err(SymmetricError::MalformedCiphertext { len: blob.len() });
    }

    let cipher = Aes256CbcDec::new_from_slices(key.as_bytes(), iv)
        .map_err(|_| SymmetricError::MalformedCiphertext { len: blob.len() })?;

    let mut buf = body.to_vec();
    let unpadded = cipher
        .decrypt_padded_mut::<Pkcs7>(&mut buf)
        .map(|plaintext| plaintext.len());

    match unpadded {
        Ok(len) => {
            buf.truncate(len);
            tracing::trace!(blob_len = blob.len(), payload_len = len, "cbc payload decrypted");
            Ok(buf)
        }
        Err(_) => {
            buf.zeroize();
            Err(SymmetricError::PaddingInvalid)
        }
    }
}
