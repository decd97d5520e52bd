//! # Protocol Configuration & Constants
//!
//! Every magic number in Courier lives here. If you're hardcoding a block
//! size somewhere else, you're doing it wrong and you owe the team coffee.
//!
//! The envelope wire format carries no version tag and no algorithm
//! identifier, so these values are effectively frozen: change one and every
//! envelope sealed before the change becomes unreadable.

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// Crate-level protocol version, reported by the CLI. Not written to the wire.
pub const PROTOCOL_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// Symmetric Parameters
// ---------------------------------------------------------------------------

/// Payload cipher used by the default envelope. Chained-block mode with
/// PKCS#7 padding and no authentication tag.
pub const SYMMETRIC_ALGORITHM: &str = "AES-256-CBC";

/// AES-256 key length in bytes. Every sealed message gets a fresh one.
pub const AES_KEY_LENGTH: usize = 32;

/// AES block length in bytes. Also the CBC IV length, and the upper bound
/// on the number of PKCS#7 padding bytes.
pub const AES_BLOCK_LENGTH: usize = 16;

/// CBC initialization vector length. Same as the block, by definition.
pub const CBC_IV_LENGTH: usize = AES_BLOCK_LENGTH;

/// Smallest well-formed CBC blob: one IV plus one padded block. An empty
/// payload encrypts to exactly this many bytes.
pub const MIN_CBC_CIPHERTEXT_LENGTH: usize = CBC_IV_LENGTH + AES_BLOCK_LENGTH;

/// Opt-in authenticated payload cipher. Not used by the default envelope.
pub const AEAD_ALGORITHM: &str = "AES-256-GCM";

/// AES-256-GCM nonce length in bytes. 96 bits. Not 16. Not 8. Twelve.
pub const AES_GCM_NONCE_LENGTH: usize = 12;

/// AES-256-GCM authentication tag length in bytes.
pub const AES_GCM_TAG_LENGTH: usize = 16;

// ---------------------------------------------------------------------------
// Asymmetric Parameters
// ---------------------------------------------------------------------------

/// Default key-wrap algorithm. PKCS#1 v1.5 encryption padding, which is what
/// the first deployments of this scheme spoke.
pub const KEY_WRAP_ALGORITHM: &str = "RSA-PKCS1-v1_5";

/// Alternative key-wrap algorithm with OAEP padding over SHA-256.
pub const KEY_WRAP_ALGORITHM_OAEP: &str = "RSA-OAEP-SHA256";

/// Modulus size used when nobody asks for anything else.
pub const DEFAULT_RSA_BITS: usize = 2048;

/// Smallest modulus the key generator will produce. Envelopes themselves
/// only enforce wrap capacity, so foreign keys below this still work if
/// they are big enough to hold the symmetric key.
pub const MIN_RSA_BITS: usize = 2048;

/// Bytes of PKCS#1 v1.5 encryption padding overhead (`00 02 PS 00`, with
/// at least 8 bytes of PS).
pub const PKCS1V15_OVERHEAD: usize = 11;

/// SHA-256 digest length, used in the OAEP overhead computation.
pub const OAEP_SHA256_HASH_LENGTH: usize = 32;

/// Bytes of OAEP padding overhead for a given hash: `2 * hLen + 2`.
pub const OAEP_SHA256_OVERHEAD: usize = 2 * OAEP_SHA256_HASH_LENGTH + 2;

/// Largest plaintext PKCS#1 v1.5 can wrap under a modulus of `modulus_bytes`.
pub const fn pkcs1v15_capacity(modulus_bytes: usize) -> usize {
    modulus_bytes.saturating_sub(PKCS1V15_OVERHEAD)
}

/// Largest plaintext OAEP-SHA256 can wrap under a modulus of `modulus_bytes`.
pub const fn oaep_sha256_capacity(modulus_bytes: usize) -> usize {
    modulus_bytes.saturating_sub(OAEP_SHA256_OVERHEAD)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crypto_parameter_sizes() {
        assert_eq!(AES_KEY_LENGTH, 32);
        assert_eq!(AES_BLOCK_LENGTH, 16);
        assert_eq!(CBC_IV_LENGTH, 16);
        assert_eq!(MIN_CBC_CIPHERTEXT_LENGTH, 32);
        assert_eq!(AES_GCM_NONCE_LENGTH, 12);
        assert_eq!(AES_GCM_TAG_LENGTH, 16);
    }

    #[test]
    fn test_default_key_fits_symmetric_key() {
        // A 2048-bit modulus is 256 bytes. Both paddings leave plenty of
        // room for a 32-byte AES key.
        let modulus_bytes = DEFAULT_RSA_BITS / 8;
        assert_eq!(pkcs1v15_capacity(modulus_bytes), 245);
        assert_eq!(oaep_sha256_capacity(modulus_bytes), 190);
        assert!(pkcs1v15_capacity(modulus_bytes) >= AES_KEY_LENGTH);
    }

    #[test]
    fn test_capacity_saturates_for_tiny_moduli() {
        assert_eq!(pkcs1v15_capacity(8), 0);
        assert_eq!(oaep_sha256_capacity(64), 0);
    }

    #[test]
    fn test_min_bits_not_above_default() {
        assert!(MIN_RSA_BITS <= DEFAULT_RSA_BITS);
    }
}
