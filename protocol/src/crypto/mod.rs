//! # Cryptographic Primitives for Courier
//!
//! The two halves of the hybrid scheme, each behind a small trait so the
//! envelope doesn't care which backend does the work:
//!
//! - [`symmetric`] -- [`SymmetricCipher`] and the default **AES-256-CBC**
//!   payload cipher, plus the [`SymmetricKey`] type.
//! - [`aead`] -- opt-in **AES-256-GCM** payload cipher for deployments that
//!   want integrity, not just confidentiality.
//! - [`asymmetric`] -- [`AsymmetricCipher`] and the **RSA** key-wrap
//!   backends (PKCS#1 v1.5 and OAEP-SHA256).
//! - [`keys`] -- RSA keypair generation and PEM import/export.
//!
//! ## A note on "rolling your own crypto"
//!
//! We don't. AES, CBC, GCM, and RSA all come from the RustCrypto crates.
//! What lives here is glue: IV handling, framing, and making sure key
//! material gets wiped.

pub mod aead;
pub mod asymmetric;
pub mod keys;
pub mod symmetric;

pub use aead::Aes256Gcm;
pub use asymmetric::{AsymmetricCipher, KeyWrapError, RsaOaep, RsaPkcs1v15};
pub use keys::{generate_keypair, public_key_from_pem, RecipientKeypair};
pub use symmetric::{Aes256Cbc, SymmetricCipher, SymmetricError, SymmetricKey};
