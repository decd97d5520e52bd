//! # CLI Interface
//!
//! Defines the command-line argument structure for `courier` using `clap`
//! derive. Supports four subcommands: `keygen`, `seal`, `open`, and
//! `version`.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::logging::LogFormat;

/// Courier hybrid envelope tool.
///
/// Seals files for a recipient's RSA public key (AES-256 for the payload,
/// RSA for the AES key) and opens them again with the private key.
#[derive(Parser, Debug)]
#[command(
    name = "courier",
    about = "Seal and open hybrid RSA + AES envelopes",
    version,
    propagate_version = true
)]
pub struct CourierCli {
    /// Log output format. Logs always go to stderr.
    #[arg(long, global = true, value_enum, env = "COURIER_LOG_FORMAT", default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Default log filter when `RUST_LOG` is not set.
    #[arg(long, global = true, env = "COURIER_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the courier binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a recipient RSA keypair as PEM files.
    Keygen(KeygenArgs),
    /// Seal a message for a recipient's public key.
    Seal(SealArgs),
    /// Open an envelope with the recipient's private key.
    Open(OpenArgs),
    /// Print version information and exit.
    Version,
}

/// RSA padding used to wrap the per-message AES key.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyWrapScheme {
    /// PKCS#1 v1.5. Interoperable with older peers.
    #[default]
    Pkcs1v15,
    /// OAEP with SHA-256.
    OaepSha256,
}

/// Payload cipher. Both ends must agree; envelopes don't record it.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PayloadCipher {
    /// AES-256-CBC with PKCS#7 padding. No integrity protection.
    #[default]
    Cbc,
    /// AES-256-GCM. Authenticated.
    Gcm,
}

/// On-disk representation of a sealed envelope.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnvelopeEncoding {
    /// JSON with hex-encoded fields.
    #[default]
    Json,
    /// Compact bincode.
    Binary,
}

/// Algorithm choices shared by `seal` and `open`.
#[derive(Args, Debug, Clone, Copy)]
pub struct SchemeArgs {
    /// Key-wrap padding.
    #[arg(long, value_enum, env = "COURIER_KEY_WRAP", default_value_t = KeyWrapScheme::Pkcs1v15)]
    pub key_wrap: KeyWrapScheme,

    /// Payload cipher.
    #[arg(long, value_enum, env = "COURIER_CIPHER", default_value_t = PayloadCipher::Cbc)]
    pub cipher: PayloadCipher,

    /// Envelope file encoding.
    #[arg(long, value_enum, env = "COURIER_ENCODING", default_value_t = EnvelopeEncoding::Json)]
    pub encoding: EnvelopeEncoding,
}

/// Arguments for the `keygen` subcommand.
#[derive(Parser, Debug)]
pub struct KeygenArgs {
    /// Directory to write `<name>.pem` and `<name>.pub.pem` into.
    /// Created if it does not exist.
    #[arg(long, short = 'd', env = "COURIER_KEY_DIR", default_value = ".")]
    pub out_dir: PathBuf,

    /// Base file name for the keypair.
    #[arg(long, short = 'n', default_value = "recipient")]
    pub name: String,

    /// RSA modulus size in bits.
    #[arg(long, default_value_t = courier_protocol::config::DEFAULT_RSA_BITS)]
    pub bits: usize,

    /// Overwrite existing key files.
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `seal` subcommand.
#[derive(Parser, Debug)]
pub struct SealArgs {
    /// Recipient public key (SPKI or PKCS#1 PEM).
    #[arg(long, short = 'r', env = "COURIER_RECIPIENT")]
    pub recipient: PathBuf,

    /// File to seal. Reads stdin when omitted.
    #[arg(long, short = 'i')]
    pub input: Option<PathBuf>,

    /// Where to write the envelope. Writes stdout when omitted.
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub scheme: SchemeArgs,
}

/// Arguments for the `open` subcommand.
#[derive(Parser, Debug)]
pub struct OpenArgs {
    /// Recipient private key (PKCS#8 or PKCS#1 PEM).
    ///
    /// **Never commit this file anywhere.** Keep it readable by you only.
    #[arg(long, short = 'k', env = "COURIER_PRIVATE_KEY")]
    pub key: PathBuf,

    /// Envelope to open. Reads stdin when omitted.
    #[arg(long, short = 'i')]
    pub input: Option<PathBuf>,

    /// Where to write the plaintext. Writes stdout when omitted.
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub scheme: SchemeArgs,
}
