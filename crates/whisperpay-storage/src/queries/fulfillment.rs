// SPDX-FileCopyrightText: 2026 Whisperpay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fulfillment writes: the status claim, the boost/gift insert, and the
//! confession mutation committed as one transaction.

use rusqlite::params;
use whisperpay_core::types::{Boost, FulfillmentEffect, Gift, PaymentOutcome};
use whisperpay_core::PaymentError;

use crate::database::Database;
use crate::queries::payments;

/// Claim the `INITIATED` record and apply the purchased effect atomically.
///
/// The conditional status claim, the effect row insert, and the confession
/// mutation run in one transaction. Returns `false` without writing anything
/// when the claim finds the record missing or already terminal. When any of
/// the effect writes fail, the transaction rolls back and the record stays
/// `INITIATED`.
pub async fn finalize_and_apply(
    db: &Database,
    order_id: &str,
    outcome: &PaymentOutcome,
    effect: &FulfillmentEffect,
) -> Result<bool, PaymentError> {
    let order_id = order_id.to_string();
    let outcome = outcome.clone();
    let effect = effect.clone();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            if !payments::claim(&tx, &order_id, &outcome)? {
                // Dropping the transaction rolls it back, though nothing
                // was written.
                return Ok(false);
            }
            match &effect {
                FulfillmentEffect::Boost(boost) => insert_boost(&tx, boost)?,
                FulfillmentEffect::Gift { gift, value } => insert_gift(&tx, gift, *value)?,
            }
            tx.commit()?;
            Ok(true)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Insert the boost row and mark the confession boosted.
fn insert_boost(conn: &rusqlite::Connection, boost: &Boost) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO boosts (target_id, order_id, duration_key, ends_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![boost.target_id, boost.order_id, boost.duration_key, boost.ends_at],
    )?;
    conn.execute(
        "UPDATE confessions SET is_boosted = 1, boost_ends_at = ?1 WHERE id = ?2",
        params![boost.ends_at, boost.target_id],
    )?;
    Ok(())
}

/// Insert the gift row and bump the confession's gift counters.
fn insert_gift(conn: &rusqlite::Connection, gift: &Gift, value: f64) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO gifts (target_id, gift_type_id, message, order_id)
         VALUES (?1, ?2, ?3, ?4)",
        params![gift.target_id, gift.gift_type_id, gift.message, gift.order_id],
    )?;
    conn.execute(
        "UPDATE confessions
         SET gift_count = gift_count + 1, gift_value = gift_value + ?1
         WHERE id = ?2",
        params![value, gift.target_id],
    )?;
    Ok(())
}

/// Count the effect rows recorded for an order id (test support).
pub async fn effect_count(db: &Database, order_id: &str) -> Result<i64, PaymentError> {
    let order_id = order_id.to_string();
    db.connection()
        .call(move |conn| {
            let count = conn.query_row(
                "SELECT (SELECT COUNT(*) FROM boosts WHERE order_id = ?1)
                      + (SELECT COUNT(*) FROM gifts WHERE order_id = ?1)",
                params![order_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::confessions;
    use tempfile::tempdir;
    use whisperpay_core::types::{PaymentRecord, PaymentStatus};

    async fn setup() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("fulfillment.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        confessions::create_confession(&db, "conf-1").await.unwrap();
        (db, dir)
    }

    async fn seed_payment(db: &Database, order_id: &str) {
        let record = PaymentRecord {
            order_id: order_id.to_string(),
            target_id: "conf-1".to_string(),
            amount: 49.99,
            currency: "949".to_string(),
            option_key: "24_hours".to_string(),
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
        };
        payments::create_payment(db, &record).await.unwrap();
    }

    fn success_outcome() -> PaymentOutcome {
        PaymentOutcome {
            status: PaymentStatus::Success,
            transaction_id: Some("TX123".to_string()),
            auth_code: Some("A7".to_string()),
            md_status: Some("1".to_string()),
            proc_return_code: Some("00".to_string()),
            error_message: None,
            raw_response: "{}".to_string(),
        }
    }

    fn boost_effect(order_id: &str) -> FulfillmentEffect {
        FulfillmentEffect::Boost(Boost {
            target_id: "conf-1".to_string(),
            order_id: order_id.to_string(),
            duration_key: "24_hours".to_string(),
            ends_at: "2026-02-02T10:00:00.000Z".to_string(),
        })
    }

    #[tokio::test]
    async fn claims_record_and_flags_confession_together() {
        let (db, _dir) = setup().await;
        seed_payment(&db, "BOOST-conf1-1").await;

        let claimed = finalize_and_apply(
            &db,
            "BOOST-conf1-1",
            &success_outcome(),
            &boost_effect("BOOST-conf1-1"),
        )
        .await
        .unwrap();
        assert!(claimed);

        let record = payments::get_payment(&db, "BOOST-conf1-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.status, PaymentStatus::Success);
        assert_eq!(record.transaction_id.as_deref(), Some("TX123"));

        let promotion = confessions::get_promotion(&db, "conf-1").await.unwrap().unwrap();
        assert!(promotion.is_boosted);
        assert_eq!(
            promotion.boost_ends_at.as_deref(),
            Some("2026-02-02T10:00:00.000Z")
        );
        assert_eq!(effect_count(&db, "BOOST-conf1-1").await.unwrap(), 1);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn gift_effect_increments_counters() {
        let (db, _dir) = setup().await;
        seed_payment(&db, "GIFT-conf1-1").await;

        let effect = FulfillmentEffect::Gift {
            gift: Gift {
                target_id: "conf-1".to_string(),
                gift_type_id: "star".to_string(),
                message: Some("loved this".to_string()),
                order_id: "GIFT-conf1-1".to_string(),
            },
            value: 14.99,
        };
        let claimed = finalize_and_apply(&db, "GIFT-conf1-1", &success_outcome(), &effect)
            .await
            .unwrap();
        assert!(claimed);

        let promotion = confessions::get_promotion(&db, "conf-1").await.unwrap().unwrap();
        assert_eq!(promotion.gift_count, 1);
        assert!((promotion.gift_value - 14.99).abs() < 1e-9);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn replay_claims_nothing_and_writes_no_second_effect() {
        let (db, _dir) = setup().await;
        seed_payment(&db, "BOOST-conf1-2").await;

        let effect = boost_effect("BOOST-conf1-2");
        let claimed = finalize_and_apply(&db, "BOOST-conf1-2", &success_outcome(), &effect)
            .await
            .unwrap();
        assert!(claimed);

        let claimed = finalize_and_apply(&db, "BOOST-conf1-2", &success_outcome(), &effect)
            .await
            .unwrap();
        assert!(!claimed, "terminal record must not be re-claimed");
        assert_eq!(effect_count(&db, "BOOST-conf1-2").await.unwrap(), 1);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn failed_effect_write_rolls_back_the_claim() {
        let (db, _dir) = setup().await;
        seed_payment(&db, "BOOST-conf1-3").await;

        // Occupy the UNIQUE order_id slot in boosts so the effect insert
        // inside finalize_and_apply fails after the claim.
        db.connection()
            .call(|conn| {
                conn.execute(
                    "INSERT INTO boosts (target_id, order_id, duration_key, ends_at)
                     VALUES ('conf-1', 'BOOST-conf1-3', '24_hours', '2026-02-02T10:00:00.000Z')",
                    [],
                )
                .map(|_| ())
            })
            .await
            .unwrap();

        let result = finalize_and_apply(
            &db,
            "BOOST-conf1-3",
            &success_outcome(),
            &boost_effect("BOOST-conf1-3"),
        )
        .await;
        assert!(result.is_err(), "conflicting effect row must fail the call");

        // The claim must have rolled back with the effect.
        let record = payments::get_payment(&db, "BOOST-conf1-3")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.status, PaymentStatus::Initiated);
        assert_eq!(effect_count(&db, "BOOST-conf1-3").await.unwrap(), 1);

        db.close().await.unwrap();
    }
}
