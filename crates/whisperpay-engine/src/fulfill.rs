// SPDX-FileCopyrightText: 2026 Whisperpay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fulfillment dispatch: resolves the purchased effect for a successful
//! payment and hands it to the store, which claims the record and applies
//! the effect in a single transaction.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::info;

use whisperpay_core::types::{Boost, FulfillmentEffect, Gift, PaymentOutcome, PaymentRecord, PurchaseKind};
use whisperpay_core::{FulfillmentStore, PaymentError};

use crate::{catalog, TIMESTAMP_FORMAT};

/// Resolves and applies boost and gift effects for successful payments.
#[derive(Clone)]
pub struct FulfillmentDispatcher {
    store: Arc<dyn FulfillmentStore>,
}

impl FulfillmentDispatcher {
    pub fn new(store: Arc<dyn FulfillmentStore>) -> Self {
        Self { store }
    }

    /// Claim the `INITIATED` record into `outcome` and apply its purchased
    /// effect, committed together as one storage transaction.
    ///
    /// Returns `false` when the record was already terminal (a duplicate
    /// delivery lost the claim); nothing is written then. An error means the
    /// effect could not be written and the claim rolled back with it, so the
    /// record is still `INITIATED` and a redelivery can retry.
    pub async fn finalize_success(
        &self,
        record: &PaymentRecord,
        outcome: &PaymentOutcome,
    ) -> Result<bool, PaymentError> {
        let effect = self.build_effect(record)?;
        let claimed = self
            .store
            .finalize_and_apply(&record.order_id, outcome, &effect)
            .await?;
        if claimed {
            match &effect {
                FulfillmentEffect::Boost(boost) => {
                    info!(
                        order_id = %record.order_id,
                        target_id = %record.target_id,
                        ends_at = %boost.ends_at,
                        "boost applied"
                    );
                }
                FulfillmentEffect::Gift { gift, .. } => {
                    info!(
                        order_id = %record.order_id,
                        target_id = %record.target_id,
                        gift_type = %gift.gift_type_id,
                        "gift applied"
                    );
                }
            }
        }
        Ok(claimed)
    }

    /// Resolve the effect from the record's order-id namespace and the
    /// server-side catalog.
    fn build_effect(&self, record: &PaymentRecord) -> Result<FulfillmentEffect, PaymentError> {
        match PurchaseKind::from_order_id(&record.order_id) {
            Some(PurchaseKind::Boost) => {
                let option = catalog::boost_option(&record.option_key).ok_or_else(|| {
                    PaymentError::Internal(format!(
                        "order {} stores unknown boost duration {}",
                        record.order_id, record.option_key
                    ))
                })?;
                let ends_at = (Utc::now() + Duration::hours(option.hours))
                    .format(TIMESTAMP_FORMAT)
                    .to_string();
                Ok(FulfillmentEffect::Boost(Boost {
                    target_id: record.target_id.clone(),
                    order_id: record.order_id.clone(),
                    duration_key: record.option_key.clone(),
                    ends_at,
                }))
            }
            Some(PurchaseKind::Gift) => {
                let gift_type = catalog::gift_type(&record.option_key).ok_or_else(|| {
                    PaymentError::Internal(format!(
                        "order {} stores unknown gift type {}",
                        record.order_id, record.option_key
                    ))
                })?;
                Ok(FulfillmentEffect::Gift {
                    gift: Gift {
                        target_id: record.target_id.clone(),
                        gift_type_id: record.option_key.clone(),
                        message: record.gift_message.clone(),
                        order_id: record.order_id.clone(),
                    },
                    value: gift_type.price,
                })
            }
            None => Err(PaymentError::Internal(format!(
                "order {} has no recognizable purchase namespace",
                record.order_id
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use tempfile::tempdir;
    use whisperpay_core::types::PaymentStatus;
    use whisperpay_core::PaymentStore;
    use whisperpay_storage::queries::confessions;
    use whisperpay_storage::SqliteStore;

    async fn setup() -> (FulfillmentDispatcher, Arc<SqliteStore>, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("fulfill.db");
        let store = Arc::new(SqliteStore::open(db_path.to_str().unwrap()).await.unwrap());
        confessions::create_confession(store.database(), "conf-1")
            .await
            .unwrap();
        (FulfillmentDispatcher::new(store.clone()), store, dir)
    }

    fn initiated_record(order_id: &str, option_key: &str, amount: f64) -> PaymentRecord {
        PaymentRecord {
            order_id: order_id.to_string(),
            target_id: "conf-1".to_string(),
            amount,
            currency: "949".to_string(),
            option_key: option_key.to_string(),
            gift_message: None,
            status: PaymentStatus::Initiated,
            transaction_id: None,
            auth_code: None,
            md_status: None,
            proc_return_code: None,
            error_message: None,
            raw_response: None,
            customer_ip: None,
            created_at: "2026-02-01T10:00:00.000Z".to_string(),
        }
    }

    fn success_outcome() -> PaymentOutcome {
        PaymentOutcome {
            status: PaymentStatus::Success,
            transaction_id: Some("TX1".to_string()),
            auth_code: Some("A1".to_string()),
            md_status: Some("1".to_string()),
            proc_return_code: Some("00".to_string()),
            error_message: None,
            raw_response: "{}".to_string(),
        }
    }

    #[tokio::test]
    async fn boost_claims_record_and_sets_expiry() {
        let (dispatcher, store, _dir) = setup().await;
        let record = initiated_record("BOOST-conf1-1714600000000", "24_hours", 49.99);
        store.create_payment(&record).await.unwrap();

        let before = Utc::now();
        let claimed = dispatcher
            .finalize_success(&record, &success_outcome())
            .await
            .unwrap();
        assert!(claimed);

        let loaded = store
            .get_payment(&record.order_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.status, PaymentStatus::Success);

        let promotion = confessions::get_promotion(store.database(), "conf-1")
            .await
            .unwrap()
            .unwrap();
        assert!(promotion.is_boosted);

        let ends_at = promotion.boost_ends_at.unwrap();
        let ends_at = DateTime::parse_from_rfc3339(&ends_at).unwrap();
        let elapsed = ends_at.signed_duration_since(before);
        assert!(
            (elapsed - Duration::hours(24)).num_seconds().abs() < 5,
            "expected ~24h expiry, got {elapsed:?}"
        );
    }

    #[tokio::test]
    async fn gift_bumps_count_and_value() {
        let (dispatcher, store, _dir) = setup().await;
        let mut record = initiated_record("GIFT-conf1-1714600000000", "star", 14.99);
        record.gift_message = Some("sending love".to_string());
        store.create_payment(&record).await.unwrap();

        let claimed = dispatcher
            .finalize_success(&record, &success_outcome())
            .await
            .unwrap();
        assert!(claimed);

        let promotion = confessions::get_promotion(store.database(), "conf-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(promotion.gift_count, 1);
        assert!((promotion.gift_value - 14.99).abs() < 1e-9);
    }

    #[tokio::test]
    async fn replay_returns_false_without_a_second_effect() {
        let (dispatcher, store, _dir) = setup().await;
        let record = initiated_record("GIFT-conf1-1714600000001", "rose", 4.99);
        store.create_payment(&record).await.unwrap();

        let claimed = dispatcher
            .finalize_success(&record, &success_outcome())
            .await
            .unwrap();
        assert!(claimed);

        let claimed = dispatcher
            .finalize_success(&record, &success_outcome())
            .await
            .unwrap();
        assert!(!claimed, "terminal record must not be re-fulfilled");

        let promotion = confessions::get_promotion(store.database(), "conf-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(promotion.gift_count, 1);
    }

    #[tokio::test]
    async fn unknown_namespace_is_an_internal_error() {
        let (dispatcher, _store, _dir) = setup().await;
        let record = initiated_record("REFUND-conf1-1", "star", 14.99);
        let err = dispatcher
            .finalize_success(&record, &success_outcome())
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::Internal(_)), "got {err}");
    }
}
