// SPDX-FileCopyrightText: 2026 Whisperpay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Whisperpay payment engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};

/// Top-level Whisperpay configuration.
///
/// Loaded from TOML files with environment variable overrides. All sections
/// default to sensible values; the validation pass enforces that merchant
/// credentials were actually provided.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WhisperpayConfig {
    /// Merchant identity, signing secret, and gateway endpoints.
    #[serde(default)]
    pub merchant: MerchantConfig,

    /// Callback verification settings.
    #[serde(default)]
    pub callback: CallbackConfig,

    /// HTTP front door settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,
}

/// Merchant store mode, as understood by the bank gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum StoreType {
    /// Full 3-D flow: the gateway authenticates the cardholder, then the
    /// merchant must confirm the charge with a server-to-server call.
    #[serde(rename = "3d")]
    ThreeD,
    /// 3D-Pay hosting: the gateway both authenticates and charges; the
    /// callback's own outcome fields are authoritative.
    #[serde(rename = "3d_pay")]
    ThreeDPay,
}

impl StoreType {
    /// Whether this mode requires the server-to-server completion call.
    pub fn requires_completion(self) -> bool {
        matches!(self, StoreType::ThreeD)
    }

    /// Wire form of the store type, as sent in the gateway parameter set.
    pub fn as_str(self) -> &'static str {
        match self {
            StoreType::ThreeD => "3d",
            StoreType::ThreeDPay => "3d_pay",
        }
    }
}

/// Deployment environment, selecting the bank endpoint set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Test,
    Production,
}

/// Merchant identity and bank gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MerchantConfig {
    /// Merchant (client) id assigned by the bank.
    #[serde(default)]
    pub client_id: String,

    /// Shared signing secret for the transaction hash.
    #[serde(default)]
    pub store_key: String,

    /// API username for the completion call. Required for `3d` store type.
    #[serde(default)]
    pub api_username: Option<String>,

    /// API password for the completion call. Required for `3d` store type.
    #[serde(default)]
    pub api_password: Option<String>,

    /// Merchant store mode.
    #[serde(default = "default_store_type")]
    pub store_type: StoreType,

    /// Deployment environment, selecting default gateway endpoints.
    #[serde(default = "default_environment")]
    pub environment: Environment,

    /// Explicit 3-D gateway form URL. Overrides the environment default.
    #[serde(default)]
    pub gateway_url: Option<String>,

    /// Explicit merchant API URL for completion calls. Overrides the
    /// environment default.
    #[serde(default)]
    pub api_url: Option<String>,

    /// ISO 4217 numeric currency code for all charges.
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl Default for MerchantConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            store_key: String::new(),
            api_username: None,
            api_password: None,
            store_type: default_store_type(),
            environment: default_environment(),
            gateway_url: None,
            api_url: None,
            currency: default_currency(),
        }
    }
}

impl MerchantConfig {
    /// Resolved 3-D gateway form URL.
    pub fn gateway_url(&self) -> &str {
        match (&self.gateway_url, self.environment) {
            (Some(url), _) => url,
            (None, Environment::Test) => "https://entegrasyon.asseco-see.com.tr/fim/est3Dgate",
            (None, Environment::Production) => "https://sanalpos.asseco-see.com.tr/fim/est3Dgate",
        }
    }

    /// Resolved merchant API URL for the completion call.
    pub fn api_url(&self) -> &str {
        match (&self.api_url, self.environment) {
            (Some(url), _) => url,
            (None, Environment::Test) => "https://entegrasyon.asseco-see.com.tr/fim/api",
            (None, Environment::Production) => "https://sanalpos.asseco-see.com.tr/fim/api",
        }
    }
}

fn default_store_type() -> StoreType {
    StoreType::ThreeDPay
}

fn default_environment() -> Environment {
    Environment::Test
}

fn default_currency() -> String {
    // TRY
    "949".to_string()
}

/// Callback verification configuration.
///
/// The accepted mdStatus set and the amount epsilon are bank-specific
/// constants; confirm both against the target bank's integration
/// documentation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CallbackConfig {
    /// mdStatus values meaning "cardholder authenticated".
    #[serde(default = "default_accepted_md_statuses")]
    pub accepted_md_statuses: Vec<String>,

    /// Maximum tolerated difference between stored and reported amounts.
    #[serde(default = "default_amount_epsilon")]
    pub amount_epsilon: f64,

    /// Publicly reachable URL of this service's callback endpoint, sent to
    /// the bank as both the ok and fail return target.
    #[serde(default)]
    pub return_url: String,

    /// Browser redirect target after a successful payment.
    #[serde(default)]
    pub success_url: String,

    /// Browser redirect target after a failed payment. The coarse error
    /// token is appended as a query parameter.
    #[serde(default)]
    pub fail_url: String,
}

impl Default for CallbackConfig {
    fn default() -> Self {
        Self {
            accepted_md_statuses: default_accepted_md_statuses(),
            amount_epsilon: default_amount_epsilon(),
            return_url: String::new(),
            success_url: String::new(),
            fail_url: String::new(),
        }
    }
}

fn default_accepted_md_statuses() -> Vec<String> {
    // 1 = full authentication, 2-4 = attempted / not enrolled.
    vec!["1".into(), "2".into(), "3".into(), "4".into()]
}

fn default_amount_epsilon() -> f64 {
    0.01
}

/// HTTP front door configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    "whisperpay.db".to_string()
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = WhisperpayConfig::default();
        assert_eq!(config.merchant.store_type, StoreType::ThreeDPay);
        assert_eq!(config.merchant.environment, Environment::Test);
        assert_eq!(config.merchant.currency, "949");
        assert_eq!(
            config.callback.accepted_md_statuses,
            vec!["1", "2", "3", "4"]
        );
        assert_eq!(config.callback.amount_epsilon, 0.01);
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn store_type_completion_requirement() {
        assert!(StoreType::ThreeD.requires_completion());
        assert!(!StoreType::ThreeDPay.requires_completion());
    }

    #[test]
    fn environment_selects_endpoints() {
        let mut merchant = MerchantConfig::default();
        assert!(merchant.gateway_url().contains("entegrasyon"));
        merchant.environment = Environment::Production;
        assert!(merchant.gateway_url().contains("sanalpos"));
        merchant.gateway_url = Some("https://bank.example/gate".to_string());
        assert_eq!(merchant.gateway_url(), "https://bank.example/gate");
    }
}
