// SPDX-FileCopyrightText: 2026 Whisperpay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Whisperpay payment engine.
//!
//! All writes go through a single tokio-rusqlite background connection; the
//! database is the sole coordination point between concurrent callbacks.

pub mod database;
pub mod migrations;
pub mod queries;
pub mod store;

pub use database::Database;
pub use store::SqliteStore;
