// SPDX-FileCopyrightText: 2026 Whisperpay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Merge hierarchy: compiled defaults < `/etc/whisperpay/whisperpay.toml` <
//! `./whisperpay.toml` < `WHISPERPAY_*` environment variables.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::WhisperpayConfig;

/// Load configuration from the standard file hierarchy with env overrides.
pub fn load_config() -> Result<WhisperpayConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(WhisperpayConfig::default()))
        .merge(Toml::file("/etc/whisperpay/whisperpay.toml"))
        .merge(Toml::file("whisperpay.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no file lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<WhisperpayConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(WhisperpayConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env overrides.
pub fn load_config_from_path(path: &Path) -> Result<WhisperpayConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(WhisperpayConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` so that key names
/// containing underscores stay intact: `WHISPERPAY_MERCHANT_STORE_KEY` must
/// map to `merchant.store_key`, not `merchant.store.key`.
fn env_provider() -> Env {
    Env::prefixed("WHISPERPAY_").map(|key| {
        // The prefix-stripped key keeps the variable's original case.
        let lowered = key.as_str().to_lowercase();
        let mapped = lowered
            .replacen("merchant_", "merchant.", 1)
            .replacen("callback_", "callback.", 1)
            .replacen("server_", "server.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("log_", "log.", 1);
        mapped.into()
    })
}
