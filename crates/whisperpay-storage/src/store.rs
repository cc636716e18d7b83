// SPDX-FileCopyrightText: 2026 Whisperpay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the core store traits.

use async_trait::async_trait;

use whisperpay_core::types::{FulfillmentEffect, PaymentOutcome, PaymentRecord};
use whisperpay_core::{FulfillmentStore, PaymentError, PaymentStore};

use crate::database::Database;
use crate::queries;

/// SQLite-backed payment and fulfillment store.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules.
#[derive(Clone)]
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    /// Open (or create) the store at the given database path.
    pub async fn open(database_path: &str) -> Result<Self, PaymentError> {
        let db = Database::open(database_path).await?;
        Ok(Self { db })
    }

    /// Build a store over an already-open database.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// The underlying database handle.
    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl PaymentStore for SqliteStore {
    async fn create_payment(&self, record: &PaymentRecord) -> Result<(), PaymentError> {
        queries::payments::create_payment(&self.db, record).await
    }

    async fn get_payment(&self, order_id: &str) -> Result<Option<PaymentRecord>, PaymentError> {
        queries::payments::get_payment(&self.db, order_id).await
    }

    async fn finalize_payment(
        &self,
        order_id: &str,
        outcome: &PaymentOutcome,
    ) -> Result<bool, PaymentError> {
        queries::payments::finalize_payment(&self.db, order_id, outcome).await
    }
}

#[async_trait]
impl FulfillmentStore for SqliteStore {
    async fn finalize_and_apply(
        &self,
        order_id: &str,
        outcome: &PaymentOutcome,
        effect: &FulfillmentEffect,
    ) -> Result<bool, PaymentError> {
        queries::fulfillment::finalize_and_apply(&self.db, order_id, outcome, effect).await
    }
}
