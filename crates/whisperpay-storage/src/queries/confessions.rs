// SPDX-FileCopyrightText: 2026 Whisperpay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Confession projection reads and seeding.
//!
//! The wider application owns the confessions table; this engine only reads
//! the promotion columns and seeds rows in tests.

use rusqlite::params;
use whisperpay_core::PaymentError;

use crate::database::Database;

/// Promotion columns of a confession row.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfessionPromotion {
    pub id: String,
    pub is_boosted: bool,
    pub boost_ends_at: Option<String>,
    pub gift_count: i64,
    pub gift_value: f64,
}

/// Insert a confession row with default promotion state.
pub async fn create_confession(db: &Database, id: &str) -> Result<(), PaymentError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute("INSERT INTO confessions (id) VALUES (?1)", params![id])?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Read a confession's promotion columns.
pub async fn get_promotion(
    db: &Database,
    id: &str,
) -> Result<Option<ConfessionPromotion>, PaymentError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, is_boosted, boost_ends_at, gift_count, gift_value
                 FROM confessions WHERE id = ?1",
            )?;
            let result = stmt.query_row(params![id], |row| {
                Ok(ConfessionPromotion {
                    id: row.get(0)?,
                    is_boosted: row.get::<_, i64>(1)? != 0,
                    boost_ends_at: row.get(2)?,
                    gift_count: row.get(3)?,
                    gift_value: row.get(4)?,
                })
            });
            match result {
                Ok(promotion) => Ok(Some(promotion)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}
