// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Courier CLI
//!
//! Entry point for the `courier` binary. Parses CLI arguments, initializes
//! logging, and dispatches to the subcommand handlers.
//!
//! The binary supports four subcommands:
//!
//! - `keygen`: generate a recipient RSA keypair as PEM files
//! - `seal`: seal a file or stdin for a recipient's public key
//! - `open`: open an envelope with the recipient's private key
//! - `version`: print build version information

mod cli;
mod commands;
mod logging;

use anyhow::Result;
use clap::Parser;

use cli::{Commands, CourierCli};

fn main() -> Result<()> {
    let cli = CourierCli::parse();
    logging::init_logging(&cli.log_level, cli.log_format);

    match cli.command {
        Commands::Keygen(args) => commands::keygen(args),
        Commands::Seal(args) => commands::seal(args),
        Commands::Open(args) => commands::open(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Prints version and algorithm information.
fn print_version() {
    use courier_protocol::config;

    println!("courier   {}", env!("CARGO_PKG_VERSION"));
    println!("protocol  {}", config::PROTOCOL_VERSION);
    println!(
        "ciphers   {} (default), {}",
        config::SYMMETRIC_ALGORITHM,
        config::AEAD_ALGORITHM
    );
    println!(
        "key wrap  {} (default), {}",
        config::KEY_WRAP_ALGORITHM,
        config::KEY_WRAP_ALGORITHM_OAEP
    );
    println!("rustc     {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}
