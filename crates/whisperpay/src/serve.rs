// SPDX-FileCopyrightText: 2026 Whisperpay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `whisperpay serve` command implementation.
//!
//! Wires the SQLite store, initiation service, and callback handler
//! together and starts the HTTP front door.

use std::sync::Arc;

use tracing::info;

use whisperpay_config::WhisperpayConfig;
use whisperpay_core::PaymentError;
use whisperpay_engine::{CallbackHandler, FulfillmentDispatcher, InitiationService};
use whisperpay_gateway::{start_server, AppState};
use whisperpay_storage::SqliteStore;

/// Start the payment service with the given configuration.
pub async fn run(config: WhisperpayConfig) -> Result<(), PaymentError> {
    init_tracing(&config.log.level);

    info!(
        environment = ?config.merchant.environment,
        store_type = config.merchant.store_type.as_str(),
        "starting whisperpay"
    );

    let store = Arc::new(SqliteStore::open(&config.storage.database_path).await?);
    info!(path = %config.storage.database_path, "storage ready");

    let config = Arc::new(config);
    let initiation = Arc::new(InitiationService::new(config.clone(), store.clone()));
    let dispatcher = FulfillmentDispatcher::new(store.clone());
    let callback = Arc::new(CallbackHandler::new(config.clone(), store.clone(), dispatcher)?);

    let state = AppState { initiation, callback };
    let result = start_server(&config.server, state).await;

    store.database().close().await?;
    result
}

/// Initialize the tracing subscriber from config, with RUST_LOG override.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("whisperpay={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
