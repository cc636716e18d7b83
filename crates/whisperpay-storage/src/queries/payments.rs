// SPDX-FileCopyrightText: 2026 Whisperpay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Payment record CRUD and the atomic status claim.

use rusqlite::params;
use whisperpay_core::types::{PaymentOutcome, PaymentRecord, PaymentStatus};
use whisperpay_core::PaymentError;

use crate::database::Database;

/// Insert a new payment record.
pub async fn create_payment(db: &Database, record: &PaymentRecord) -> Result<(), PaymentError> {
    let record = record.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO payments (order_id, target_id, amount, currency, option_key,
                                       gift_message, status, customer_ip, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    record.order_id,
                    record.target_id,
                    record.amount,
                    record.currency,
                    record.option_key,
                    record.gift_message,
                    record.status.to_string(),
                    record.customer_ip,
                    record.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Load a payment record by order id.
pub async fn get_payment(
    db: &Database,
    order_id: &str,
) -> Result<Option<PaymentRecord>, PaymentError> {
    let order_id = order_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT order_id, target_id, amount, currency, option_key, gift_message,
                        status, transaction_id, auth_code, md_status, proc_return_code,
                        error_message, raw_response, customer_ip, created_at
                 FROM payments WHERE order_id = ?1",
            )?;
            let result = stmt.query_row(params![order_id], |row| {
                let status: String = row.get(6)?;
                let status = status.parse::<PaymentStatus>().map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        6,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;
                Ok(PaymentRecord {
                    order_id: row.get(0)?,
                    target_id: row.get(1)?,
                    amount: row.get(2)?,
                    currency: row.get(3)?,
                    option_key: row.get(4)?,
                    gift_message: row.get(5)?,
                    status,
                    transaction_id: row.get(7)?,
                    auth_code: row.get(8)?,
                    md_status: row.get(9)?,
                    proc_return_code: row.get(10)?,
                    error_message: row.get(11)?,
                    raw_response: row.get(12)?,
                    customer_ip: row.get(13)?,
                    created_at: row.get(14)?,
                })
            });
            match result {
                Ok(record) => Ok(Some(record)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Conditional status claim, usable standalone or inside a wider transaction.
///
/// A single UPDATE guarded on `status = 'INITIATED'`: of any set of
/// concurrent callbacks for the same order, exactly one observes a changed
/// row count of 1 and wins the claim. Returns `false` when the record was
/// missing or already terminal; nothing is written in that case.
pub(crate) fn claim(
    conn: &rusqlite::Connection,
    order_id: &str,
    outcome: &PaymentOutcome,
) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "UPDATE payments
         SET status = ?1, transaction_id = ?2, auth_code = ?3, md_status = ?4,
             proc_return_code = ?5, error_message = ?6, raw_response = ?7
         WHERE order_id = ?8 AND status = 'INITIATED'",
        params![
            outcome.status.to_string(),
            outcome.transaction_id,
            outcome.auth_code,
            outcome.md_status,
            outcome.proc_return_code,
            outcome.error_message,
            outcome.raw_response,
            order_id,
        ],
    )?;
    Ok(changed == 1)
}

/// Atomically transition an `INITIATED` record to its terminal outcome.
pub async fn finalize_payment(
    db: &Database,
    order_id: &str,
    outcome: &PaymentOutcome,
) -> Result<bool, PaymentError> {
    let order_id = order_id.to_string();
    let outcome = outcome.clone();
    db.connection()
        .call(move |conn| claim(conn, &order_id, &outcome))
        .await
        .map_err(crate::database::map_tr_err)
}
