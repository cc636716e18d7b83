// SPDX-FileCopyrightText: 2026 Whisperpay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The 3-D Secure payment authorization and fulfillment engine.
//!
//! Control flow: a purchase request enters through [`initiate`], which fixes
//! the price server-side, persists an `INITIATED` record, and returns a
//! signed redirect form for the bank gateway. The bank calls back
//! asynchronously into [`callback`], which verifies the signature and amount,
//! resolves the charge outcome (directly, or through [`completion`] for `3d`
//! merchants), atomically finalizes the record, and hands successful orders
//! to [`fulfill`].

pub mod callback;
pub mod catalog;
pub mod completion;
pub mod fulfill;
pub mod hash;
pub mod initiate;

pub use callback::{CallbackHandler, CallbackResult};
pub use completion::{CompletionClient, CompletionResult};
pub use fulfill::FulfillmentDispatcher;
pub use initiate::{InitiationService, PurchaseRequest};

/// Timestamp format used for persisted ISO 8601 strings.
pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";
