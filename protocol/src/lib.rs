// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Courier Protocol
//!
//! Courier seals messages for a recipient the way everybody has done it
//! since PGP: a fresh AES key encrypts the message, and the recipient's RSA
//! public key encrypts the AES key. RSA is too slow and too small for bulk
//! data; AES needs a way to get its key across. Together they cover for
//! each other.
//!
//! ## Architecture
//!
//! - **config**: Protocol constants. Key sizes, block sizes, padding
//!   overheads. No magic numbers anywhere else.
//! - **crypto**: The primitives, each behind a trait: AES-256-CBC (and
//!   opt-in AES-256-GCM) for payloads, RSA (PKCS#1 v1.5 or OAEP) for key
//!   wrapping, plus keypair generation and PEM handling.
//! - **envelope**: [`HybridEnvelope`](envelope::HybridEnvelope), which
//!   composes the two into `seal`/`open`, and
//!   [`SealedEnvelope`](envelope::SealedEnvelope), the thing you ship.
//!
//! ## Quick start
//!
//! ```no_run
//! use courier_protocol::crypto::generate_keypair;
//! use courier_protocol::envelope::{open, seal};
//!
//! let (public, private) = generate_keypair(2048).unwrap();
//! let sealed = seal(b"This is a secret message from the client.", &public).unwrap();
//! let message = open(&sealed, &private).unwrap();
//! assert_eq!(message, b"This is a secret message from the client.");
//! ```
//!
//! ## Design Philosophy
//!
//! 1. Confidentiality is what the default envelope gives you. Integrity is
//!    not: see the `envelope` module docs before you rely on it.
//! 2. Key material lives for one call and is zeroized on the way out,
//!    success or failure.
//! 3. Every failure is a distinct error variant. Nothing is retried,
//!    nothing is swallowed, no half-decrypted plaintext escapes.

pub mod config;
pub mod crypto;
pub mod envelope;
