// SPDX-FileCopyrightText: 2026 Whisperpay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Whisperpay payment engine.

use thiserror::Error;

/// The primary error type used across the Whisperpay workspace.
///
/// Callback-path variants (`HashMismatch`, `AmountMismatch`,
/// `AuthenticationRejected`, `Completion`) carry the internal reason that is
/// persisted for audit; the user-facing redirect only ever exposes a coarse
/// error token, never these messages.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Malformed purchase request (card fields, unknown purchase option).
    /// Rejected before any payment record is created.
    #[error("validation error: {0}")]
    Validation(String),

    /// Missing or inconsistent merchant configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Payment store errors (database connection, query failure).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The callback signature did not match the recomputed digest.
    #[error("hash verification failed for order {order_id}")]
    HashMismatch { order_id: String },

    /// The callback reported an amount that differs from the stored amount.
    #[error("amount mismatch for order {order_id}: stored {stored}, reported {reported}")]
    AmountMismatch {
        order_id: String,
        stored: f64,
        reported: f64,
    },

    /// The 3-D authentication status was not in the accepted set.
    #[error("3-D authentication rejected (mdStatus {md_status})")]
    AuthenticationRejected { md_status: String },

    /// The server-to-server completion call failed or returned non-approval.
    #[error("completion call failed: {message}")]
    Completion {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Callback for an unknown order or one already in a terminal state.
    #[error("stale or unknown callback for order {order_id}")]
    StaleCallback { order_id: String },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
