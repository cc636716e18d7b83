// SPDX-FileCopyrightText: 2026 Whisperpay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes: merchant credentials present, completion credentials present
//! for the `3d` store type, redirect URLs set, epsilon non-negative.

use thiserror::Error;

use crate::model::WhisperpayConfig;

/// A configuration error collected during loading or validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Figment-level parse or merge error.
    #[error("config parse error: {0}")]
    Figment(String),

    /// Semantic validation error.
    #[error("config validation error: {0}")]
    Validation(String),
}

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects all validation errors rather than failing fast.
pub fn validate_config(config: &WhisperpayConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.merchant.client_id.trim().is_empty() {
        errors.push(ConfigError::Validation(
            "merchant.client_id must be set".to_string(),
        ));
    }

    if config.merchant.store_key.trim().is_empty() {
        errors.push(ConfigError::Validation(
            "merchant.store_key must be set".to_string(),
        ));
    }

    if config.merchant.store_type.requires_completion() {
        if config.merchant.api_username.as_deref().unwrap_or("").is_empty() {
            errors.push(ConfigError::Validation(
                "merchant.api_username is required for store_type = \"3d\"".to_string(),
            ));
        }
        if config.merchant.api_password.as_deref().unwrap_or("").is_empty() {
            errors.push(ConfigError::Validation(
                "merchant.api_password is required for store_type = \"3d\"".to_string(),
            ));
        }
    }

    if config.callback.return_url.trim().is_empty() {
        errors.push(ConfigError::Validation(
            "callback.return_url must be set".to_string(),
        ));
    }

    if config.callback.success_url.trim().is_empty() {
        errors.push(ConfigError::Validation(
            "callback.success_url must be set".to_string(),
        ));
    }

    if config.callback.fail_url.trim().is_empty() {
        errors.push(ConfigError::Validation(
            "callback.fail_url must be set".to_string(),
        ));
    }

    if config.callback.amount_epsilon < 0.0 {
        errors.push(ConfigError::Validation(format!(
            "callback.amount_epsilon must be non-negative, got {}",
            config.callback.amount_epsilon
        )));
    }

    if config.callback.accepted_md_statuses.is_empty() {
        errors.push(ConfigError::Validation(
            "callback.accepted_md_statuses must not be empty".to_string(),
        ));
    }

    if config.server.host.trim().is_empty() {
        errors.push(ConfigError::Validation(
            "server.host must not be empty".to_string(),
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation(
            "storage.database_path must not be empty".to_string(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MerchantConfig, StoreType};

    fn valid_config() -> WhisperpayConfig {
        let mut config = WhisperpayConfig::default();
        config.merchant.client_id = "100100000".to_string();
        config.merchant.store_key = "TEST1234".to_string();
        config.callback.return_url = "https://app.example/v1/payments/callback".to_string();
        config.callback.success_url = "https://app.example/pay/ok".to_string();
        config.callback.fail_url = "https://app.example/pay/fail".to_string();
        config
    }

    #[test]
    fn valid_config_passes() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn empty_config_collects_all_errors() {
        let errors = validate_config(&WhisperpayConfig::default()).unwrap_err();
        assert!(errors.len() >= 4, "expected several errors, got {errors:?}");
    }

    #[test]
    fn three_d_requires_api_credentials() {
        let mut config = valid_config();
        config.merchant = MerchantConfig {
            store_type: StoreType::ThreeD,
            ..config.merchant
        };
        let errors = validate_config(&config).unwrap_err();
        let rendered: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        assert!(rendered.iter().any(|m| m.contains("api_username")));
        assert!(rendered.iter().any(|m| m.contains("api_password")));

        config.merchant.api_username = Some("API_USER".to_string());
        config.merchant.api_password = Some("API_PASS".to_string());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn negative_epsilon_is_rejected() {
        let mut config = valid_config();
        config.callback.amount_epsilon = -0.5;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.to_string().contains("amount_epsilon")));
    }
}
