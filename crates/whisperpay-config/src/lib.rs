// SPDX-FileCopyrightText: 2026 Whisperpay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Whisperpay payment engine.
//!
//! Provides TOML configuration parsing with strict validation
//! (`deny_unknown_fields`), environment variable overrides via the
//! `WHISPERPAY_` prefix, and a post-deserialization validation pass that
//! refuses to start without merchant credentials.
//!
//! # Usage
//!
//! ```no_run
//! use whisperpay_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("merchant: {}", config.merchant.client_id);
//! ```

pub mod loader;
pub mod model;
pub mod validation;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{
    CallbackConfig, Environment, LogConfig, MerchantConfig, ServerConfig, StorageConfig,
    StoreType, WhisperpayConfig,
};
pub use validation::{validate_config, ConfigError};

/// Load configuration from the standard file hierarchy and validate it.
pub fn load_and_validate() -> Result<WhisperpayConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(vec![ConfigError::Figment(err.to_string())]),
    }
}

/// Load configuration from a TOML string and validate it.
///
/// Useful for testing and explicit configuration.
pub fn load_and_validate_str(toml_content: &str) -> Result<WhisperpayConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(vec![ConfigError::Figment(err.to_string())]),
    }
}

/// Print collected configuration errors to stderr, one per line.
pub fn render_errors(errors: &[ConfigError]) {
    for error in errors {
        eprintln!("whisperpay: {error}");
    }
}
