// SPDX-FileCopyrightText: 2026 Whisperpay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Whisperpay payment engine.
//!
//! This crate provides the error type, the persisted domain types, and the
//! async store traits that decouple the engine from its SQLite persistence.

pub mod error;
pub mod traits;
pub mod types;

pub use error::PaymentError;
pub use traits::{FulfillmentStore, PaymentStore};
pub use types::{
    Boost, FulfillmentEffect, Gift, PaymentOutcome, PaymentRecord, PaymentStatus, PurchaseKind,
    RedirectForm,
};
