//! End-to-end tests for Courier envelopes.
//!
//! These exercise the public API the way a client and a server would use
//! it: the server owns a 2048-bit keypair, the client seals to the public
//! half, the server opens with the private half. The scenarios at the top
//! are the classic client/server suite (secret message, 1 MB message,
//! special characters, tampering); the rest pin down padding boundaries,
//! key freshness, tamper sensitivity, and cross-key rejection.
//!
//! RSA key generation dominates the runtime, so the keypairs are created
//! once and shared.

use std::sync::OnceLock;

use courier_protocol::config::{AES_BLOCK_LENGTH, CBC_IV_LENGTH, DEFAULT_RSA_BITS};
use courier_protocol::crypto::{RecipientKeypair, RsaOaep};
use courier_protocol::envelope::{open, seal, EnvelopeError, HybridEnvelope, SealedEnvelope};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

fn server() -> &'static RecipientKeypair {
    static KEY: OnceLock<RecipientKeypair> = OnceLock::new();
    KEY.get_or_init(|| RecipientKeypair::generate(DEFAULT_RSA_BITS).expect("server keypair"))
}

fn other_server() -> &'static RecipientKeypair {
    static KEY: OnceLock<RecipientKeypair> = OnceLock::new();
    KEY.get_or_init(|| RecipientKeypair::generate(DEFAULT_RSA_BITS).expect("other keypair"))
}

/// Client side: seal to the server's public key.
fn client_send(message: &[u8]) -> SealedEnvelope {
    seal(message, server().public_key()).expect("seal")
}

/// Server side: open with the server's private key.
fn server_receive(envelope: &SealedEnvelope) -> Result<Vec<u8>, EnvelopeError> {
    open(envelope, server().private_key())
}

// ---------------------------------------------------------------------------
// Client/server scenarios
// ---------------------------------------------------------------------------

#[test]
fn secure_communication() {
    let message = "This is a secret message from the client.";
    let envelope = client_send(message.as_bytes());
    let decrypted = server_receive(&envelope).unwrap();
    assert_eq!(String::from_utf8(decrypted).unwrap(), message);
}

#[test]
fn large_message() {
    let message = "A".repeat(1_000_000);
    let envelope = client_send(message.as_bytes());
    let decrypted = server_receive(&envelope).unwrap();
    assert_eq!(decrypted.len(), 1_000_000);
    assert_eq!(decrypted, message.as_bytes());
}

#[test]
fn special_characters() {
    let message = "!@#$%^&*()_+{}:\"<>?[];',./`~";
    let envelope = client_send(message.as_bytes());
    assert_eq!(server_receive(&envelope).unwrap(), message.as_bytes());
}

#[test]
fn message_integrity_first_byte_flip() {
    // Flipping the first ciphertext byte hits the IV, which flips the first
    // plaintext bit and leaves the padding alone. Without a MAC the server
    // can't notice, so the only guarantee is that it never hands back the
    // original message as if nothing happened.
    let original = "This message should remain intact.";
    let mut envelope = client_send(original.as_bytes());
    envelope.ciphertext[0] ^= 0x01;

    match server_receive(&envelope) {
        Err(_) => {}
        Ok(decrypted) => {
            assert_ne!(decrypted, original.as_bytes());
            assert_eq!(decrypted[0], original.as_bytes()[0] ^ 0x01);
        }
    }
}

// ---------------------------------------------------------------------------
// Boundaries and byte values
// ---------------------------------------------------------------------------

#[test]
fn block_boundary_sizes_roundtrip() {
    for len in [
        0,
        1,
        AES_BLOCK_LENGTH - 1,
        AES_BLOCK_LENGTH,
        AES_BLOCK_LENGTH + 1,
        2 * AES_BLOCK_LENGTH,
    ] {
        let message: Vec<u8> = (0..len).map(|i| i as u8).collect();
        let envelope = client_send(&message);
        let expected_blocks = len / AES_BLOCK_LENGTH + 1;
        assert_eq!(
            envelope.ciphertext.len(),
            CBC_IV_LENGTH + expected_blocks * AES_BLOCK_LENGTH,
            "len {len}"
        );
        assert_eq!(server_receive(&envelope).unwrap(), message, "len {len}");
    }
}

#[test]
fn all_byte_values_roundtrip() {
    let mut message: Vec<u8> = (0..=255u8).collect();
    message.extend_from_slice(b"\0\0embedded nulls\0");
    let envelope = client_send(&message);
    assert_eq!(server_receive(&envelope).unwrap(), message);
}

// ---------------------------------------------------------------------------
// Freshness
// ---------------------------------------------------------------------------

#[test]
fn sealing_twice_never_repeats() {
    let a = client_send(b"same message");
    let b = client_send(b"same message");
    assert_ne!(a.wrapped_key, b.wrapped_key);
    assert_ne!(a.ciphertext, b.ciphertext);
    assert_ne!(&a.ciphertext[..CBC_IV_LENGTH], &b.ciphertext[..CBC_IV_LENGTH]);
}

// ---------------------------------------------------------------------------
// Tamper sensitivity
// ---------------------------------------------------------------------------

#[test]
fn single_bit_flips_never_return_the_original() {
    let original = b"This message should remain intact.";
    let envelope = client_send(original);
    let bits = envelope.ciphertext.len() * 8;

    let mut rejected = 0usize;
    for bit in 0..bits {
        let mut tampered = envelope.clone();
        tampered.ciphertext[bit / 8] ^= 1 << (bit % 8);
        match server_receive(&tampered) {
            Err(EnvelopeError::PaddingInvalid) | Err(EnvelopeError::MalformedCiphertext { .. }) => {
                rejected += 1
            }
            Err(other) => panic!("bit {bit}: unexpected error {other}"),
            Ok(decrypted) => assert_ne!(decrypted, original, "bit {bit}"),
        }
    }

    // Flips in the IV and the first block are silent (that's CBC), but the
    // last two blocks of this message feed the padding check.
    assert!(rejected > 0);
}

#[test]
fn final_block_flips_are_almost_always_rejected() {
    // A flip in the final ciphertext block scrambles the whole final
    // plaintext block. Random bytes end in valid PKCS#7 with probability
    // of roughly 1/256, so across 128 flips we should see a handful of
    // survivors at most.
    let original = b"This message should remain intact.";
    let envelope = client_send(original);
    let last_block = envelope.ciphertext.len() - AES_BLOCK_LENGTH;

    let mut rejected = 0usize;
    for bit in 0..AES_BLOCK_LENGTH * 8 {
        let mut tampered = envelope.clone();
        tampered.ciphertext[last_block + bit / 8] ^= 1 << (bit % 8);
        match server_receive(&tampered) {
            Err(EnvelopeError::PaddingInvalid) => rejected += 1,
            Err(other) => panic!("bit {bit}: unexpected error {other}"),
            Ok(decrypted) => assert_ne!(decrypted, original, "bit {bit}"),
        }
    }
    assert!(rejected >= 120, "only {rejected}/128 flips rejected");
}

#[test]
fn truncation_is_malformed() {
    let mut envelope = client_send(b"hello");
    envelope.ciphertext.truncate(CBC_IV_LENGTH + 5);
    assert!(matches!(
        server_receive(&envelope),
        Err(EnvelopeError::MalformedCiphertext { .. })
    ));
}

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

#[test]
fn cross_key_rejection() {
    let message = b"only the real server may read this";
    let envelope = client_send(message);

    match open(&envelope, other_server().private_key()) {
        Err(EnvelopeError::KeyUnwrapFailed)
        | Err(EnvelopeError::PaddingInvalid)
        | Err(EnvelopeError::MalformedCiphertext { .. }) => {}
        Err(other) => panic!("unexpected error: {other}"),
        Ok(decrypted) => assert_ne!(decrypted, message),
    }
}

#[test]
fn keys_survive_pem_roundtrip() {
    let public_pem = server().public_key_pem().unwrap();
    let private_pem = server().private_key_pem().unwrap();

    let public = courier_protocol::crypto::public_key_from_pem(&public_pem).unwrap();
    let restored = RecipientKeypair::from_private_key_pem(&private_pem).unwrap();

    let envelope = seal(b"persisted keys", &public).unwrap();
    assert_eq!(open(&envelope, restored.private_key()).unwrap(), b"persisted keys");
}

#[test]
fn oaep_and_pkcs1_envelopes_do_not_mix() {
    let oaep = HybridEnvelope::new(RsaOaep);
    let envelope = oaep.seal(b"oaep only", server().public_key()).unwrap();
    assert_eq!(oaep.open(&envelope, server().private_key()).unwrap(), b"oaep only");
    assert!(server_receive(&envelope).is_err());
}

// ---------------------------------------------------------------------------
// Transport encodings and concurrency
// ---------------------------------------------------------------------------

#[test]
fn envelope_survives_json_and_bincode() {
    let envelope = client_send(b"over the wire");

    let json = envelope.to_json().unwrap();
    let from_json = SealedEnvelope::from_json(&json).unwrap();
    assert_eq!(server_receive(&from_json).unwrap(), b"over the wire");

    let bytes = envelope.to_bytes().unwrap();
    let from_bytes = SealedEnvelope::from_bytes(&bytes).unwrap();
    assert_eq!(server_receive(&from_bytes).unwrap(), b"over the wire");
}

#[test]
fn concurrent_seal_and_open() {
    let public = server().public_key();
    let private = server().private_key();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4u8)
            .map(|t| {
                scope.spawn(move || {
                    for i in 0..4u8 {
                        let message = vec![t.wrapping_mul(31).wrapping_add(i); 100 + i as usize];
                        let envelope = seal(&message, public).unwrap();
                        assert_eq!(open(&envelope, private).unwrap(), message);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    });
}
