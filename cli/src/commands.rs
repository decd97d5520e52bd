//! Subcommand handlers for `keygen`, `seal`, and `open`.
//!
//! Each handler takes its parsed argument struct and does all of its own
//! file handling, so tests can drive them directly against a temp dir.

use anyhow::{bail, Context, Result};
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use zeroize::Zeroizing;

use courier_protocol::crypto::{
    public_key_from_pem, Aes256Gcm, RecipientKeypair, RsaOaep, RsaPkcs1v15,
};
use courier_protocol::envelope::{EnvelopeError, HybridEnvelope, SealedEnvelope};
use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::cli::{
    EnvelopeEncoding, KeyWrapScheme, KeygenArgs, OpenArgs, PayloadCipher, SchemeArgs, SealArgs,
};

/// Generates a recipient keypair and writes it as `<name>.pem` (private,
/// PKCS#8) and `<name>.pub.pem` (public, SPKI).
pub fn keygen(args: KeygenArgs) -> Result<()> {
    fs::create_dir_all(&args.out_dir).with_context(|| {
        format!(
            "failed to create key directory: {}",
            args.out_dir.display()
        )
    })?;

    let private_path = args.out_dir.join(format!("{}.pem", args.name));
    let public_path = args.out_dir.join(format!("{}.pub.pem", args.name));

    if !args.force {
        for path in [&private_path, &public_path] {
            if path.exists() {
                bail!(
                    "{} already exists (pass --force to overwrite)",
                    path.display()
                );
            }
        }
    }

    let keypair = RecipientKeypair::generate(args.bits)
        .with_context(|| format!("failed to generate {}-bit RSA keypair", args.bits))?;

    let private_pem = keypair.private_key_pem().context("failed to encode private key")?;
    fs::write(&private_path, private_pem.as_bytes())
        .with_context(|| format!("failed to write private key: {}", private_path.display()))?;

    // Restrict permissions on Unix.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&private_path, fs::Permissions::from_mode(0o600))?;
    }

    let public_pem = keypair.public_key_pem().context("failed to encode public key")?;
    fs::write(&public_path, public_pem)
        .with_context(|| format!("failed to write public key: {}", public_path.display()))?;

    tracing::info!(
        bits = keypair.bits(),
        private_key = %private_path.display(),
        public_key = %public_path.display(),
        "recipient keypair generated"
    );

    println!("Keypair generated.");
    println!("  Bits        : {}", keypair.bits());
    println!("  Private key : {}", private_path.display());
    println!("  Public key  : {}", public_path.display());
    println!();
    println!("Share the .pub.pem file. Keep the other one to yourself.");

    Ok(())
}

/// Seals a file (or stdin) for the recipient's public key.
pub fn seal(args: SealArgs) -> Result<()> {
    let pem = fs::read_to_string(&args.recipient)
        .with_context(|| format!("failed to read public key: {}", args.recipient.display()))?;
    let recipient = public_key_from_pem(&pem)
        .with_context(|| format!("invalid public key: {}", args.recipient.display()))?;

    let message = read_input(args.input.as_deref())?;
    let envelope =
        seal_message(args.scheme, &message, &recipient).context("failed to seal message")?;
    let encoded = encode_envelope(&envelope, args.scheme.encoding)?;

    tracing::info!(
        message_len = message.len(),
        envelope_len = encoded.len(),
        key_wrap = ?args.scheme.key_wrap,
        cipher = ?args.scheme.cipher,
        "message sealed"
    );

    write_output(args.output.as_deref(), &encoded)
}

/// Opens an envelope with the recipient's private key.
pub fn open(args: OpenArgs) -> Result<()> {
    let pem = Zeroizing::new(
        fs::read_to_string(&args.key)
            .with_context(|| format!("failed to read private key: {}", args.key.display()))?,
    );
    let keypair = RecipientKeypair::from_private_key_pem(&pem)
        .with_context(|| format!("invalid private key: {}", args.key.display()))?;

    let raw = read_input(args.input.as_deref())?;
    let envelope = decode_envelope(&raw, args.scheme.encoding)?;
    let plaintext = Zeroizing::new(
        open_message(args.scheme, &envelope, keypair.private_key())
            .context("failed to open envelope")?,
    );

    tracing::info!(
        envelope_len = raw.len(),
        plaintext_len = plaintext.len(),
        "envelope opened"
    );

    write_output(args.output.as_deref(), &plaintext)
}

fn seal_message(
    scheme: SchemeArgs,
    message: &[u8],
    recipient: &RsaPublicKey,
) -> Result<SealedEnvelope, EnvelopeError> {
    match (scheme.key_wrap, scheme.cipher) {
        (KeyWrapScheme::Pkcs1v15, PayloadCipher::Cbc) => {
            HybridEnvelope::new(RsaPkcs1v15).seal(message, recipient)
        }
        (KeyWrapScheme::Pkcs1v15, PayloadCipher::Gcm) => {
            HybridEnvelope::with_symmetric(RsaPkcs1v15, Aes256Gcm).seal(message, recipient)
        }
        (KeyWrapScheme::OaepSha256, PayloadCipher::Cbc) => {
            HybridEnvelope::new(RsaOaep).seal(message, recipient)
        }
        (KeyWrapScheme::OaepSha256, PayloadCipher::Gcm) => {
            HybridEnvelope::with_symmetric(RsaOaep, Aes256Gcm).seal(message, recipient)
        }
    }
}

fn open_message(
    scheme: SchemeArgs,
    envelope: &SealedEnvelope,
    recipient: &RsaPrivateKey,
) -> Result<Vec<u8>, EnvelopeError> {
    match (scheme.key_wrap, scheme.cipher) {
        (KeyWrapScheme::Pkcs1v15, PayloadCipher::Cbc) => {
            HybridEnvelope::new(RsaPkcs1v15).open(envelope, recipient)
        }
        (KeyWrapScheme::Pkcs1v15, PayloadCipher::Gcm) => {
            HybridEnvelope::with_symmetric(RsaPkcs1v15, Aes256Gcm).open(envelope, recipient)
        }
        (KeyWrapScheme::OaepSha256, PayloadCipher::Cbc) => {
            HybridEnvelope::new(RsaOaep).open(envelope, recipient)
        }
        (KeyWrapScheme::OaepSha256, PayloadCipher::Gcm) => {
            HybridEnvelope::with_symmetric(RsaOaep, Aes256Gcm).open(envelope, recipient)
        }
    }
}

fn encode_envelope(envelope: &SealedEnvelope, encoding: EnvelopeEncoding) -> Result<Vec<u8>> {
    let encoded = match encoding {
        EnvelopeEncoding::Json => {
            let mut json = envelope.to_json()?;
            json.push('\n');
            json.into_bytes()
        }
        EnvelopeEncoding::Binary => envelope.to_bytes()?,
    };
    Ok(encoded)
}

fn decode_envelope(raw: &[u8], encoding: EnvelopeEncoding) -> Result<SealedEnvelope> {
    let envelope = match encoding {
        EnvelopeEncoding::Json => {
            let text = std::str::from_utf8(raw).context("envelope is not UTF-8 JSON")?;
            SealedEnvelope::from_json(text.trim())?
        }
        EnvelopeEncoding::Binary => SealedEnvelope::from_bytes(raw)?,
    };
    Ok(envelope)
}

fn read_input(path: Option<&Path>) -> Result<Vec<u8>> {
    match path {
        Some(path) => {
            fs::read(path).with_context(|| format!("failed to read input: {}", path.display()))
        }
        None => {
            let mut buf = Vec::new();
            io::stdin()
                .lock()
                .read_to_end(&mut buf)
                .context("failed to read stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&Path>, bytes: &[u8]) -> Result<()> {
    match path {
        Some(path) => {
            fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(bytes).context("failed to write stdout")?;
            stdout.flush().context("failed to flush stdout")
        }
    }
}
