// SPDX-FileCopyrightText: 2026 Whisperpay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Store traits decoupling the engine from its persistence backend.

pub mod store;

pub use store::{FulfillmentStore, PaymentStore};
