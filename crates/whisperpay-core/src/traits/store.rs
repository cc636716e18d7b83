// SPDX-FileCopyrightText: 2026 Whisperpay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence traits for payment records and fulfillment effects.
//!
//! The payment store is the single source of truth and the sole coordination
//! point between near-simultaneous callbacks: there is no in-process cache of
//! payment state anywhere in the engine.

use async_trait::async_trait;

use crate::error::PaymentError;
use crate::types::{FulfillmentEffect, PaymentOutcome, PaymentRecord};

/// Persisted record of every purchase attempt and its lifecycle.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Persist a new payment record in `INITIATED` status.
    async fn create_payment(&self, record: &PaymentRecord) -> Result<(), PaymentError>;

    /// Load a payment record by order id.
    async fn get_payment(&self, order_id: &str) -> Result<Option<PaymentRecord>, PaymentError>;

    /// Atomically transition an `INITIATED` record to the terminal outcome.
    ///
    /// Returns `true` when this call claimed the record. Returns `false` when
    /// the record is missing or already terminal -- a duplicate or replayed
    /// callback -- in which case nothing was written. The claim must be a
    /// single conditional update, never a read followed by a write.
    async fn finalize_payment(
        &self,
        order_id: &str,
        outcome: &PaymentOutcome,
    ) -> Result<bool, PaymentError>;
}

/// Applies purchased effects to the target confession.
#[async_trait]
pub trait FulfillmentStore: Send + Sync {
    /// Claim the `INITIATED` record into its successful terminal outcome and
    /// apply the purchased effect, all in one transaction.
    ///
    /// Returns `true` when this call claimed the record and wrote the effect.
    /// Returns `false` when the record was missing or already terminal (a
    /// duplicate or replayed callback); nothing is written in that case.
    /// When writing the effect fails, the claim rolls back with it and the
    /// record stays `INITIATED`, so a record can never read `SUCCESS` without
    /// its effect committed alongside.
    async fn finalize_and_apply(
        &self,
        order_id: &str,
        outcome: &PaymentOutcome,
        effect: &FulfillmentEffect,
    ) -> Result<bool, PaymentError>;
}
