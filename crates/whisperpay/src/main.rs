// SPDX-FileCopyrightText: 2026 Whisperpay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Whisperpay - bank-hosted 3-D Secure payments for confession boosts
//! and gifts.
//!
//! This is the binary entry point for the payment service.

use clap::{Parser, Subcommand};

mod serve;

/// Whisperpay payment service.
#[derive(Parser, Debug)]
#[command(name = "whisperpay", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the payment API server.
    Serve,
    /// Load and validate configuration, then exit.
    CheckConfig,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match whisperpay_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            whisperpay_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::CheckConfig) => {
            println!(
                "whisperpay: config ok (merchant.client_id={}, environment={:?})",
                config.merchant.client_id, config.merchant.environment
            );
        }
        Some(Commands::Serve) | None => {
            if let Err(e) = serve::run(config).await {
                eprintln!("whisperpay: {e}");
                std::process::exit(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["whisperpay", "serve"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Serve)));

        let cli = Cli::try_parse_from(["whisperpay", "check-config"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::CheckConfig)));

        let cli = Cli::try_parse_from(["whisperpay"]).unwrap();
        assert!(cli.command.is_none());
    }
}
