// SPDX-FileCopyrightText: 2026 Whisperpay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP front door for the payment engine.
//!
//! Exposes purchase initiation and the bank callback over axum. The
//! callback is routed for both GET and POST into the same engine entry
//! point, so the two transports cannot drift apart.

pub mod handlers;
pub mod server;

pub use server::{build_router, start_server, AppState};
