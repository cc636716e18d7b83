// SPDX-FileCopyrightText: 2026 Whisperpay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Static price and duration tables.
//!
//! The authoritative price for every purchase option lives here and is fixed
//! server-side at initiation; amounts arriving from a client are never
//! trusted.

use whisperpay_core::types::PurchaseKind;

/// A purchasable boost duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoostOption {
    pub key: &'static str,
    pub hours: i64,
    pub price: f64,
}

/// A purchasable gift type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GiftType {
    pub id: &'static str,
    pub label: &'static str,
    pub price: f64,
}

/// Allowed boost durations.
pub const BOOST_OPTIONS: &[BoostOption] = &[
    BoostOption { key: "1_hour", hours: 1, price: 4.99 },
    BoostOption { key: "6_hours", hours: 6, price: 14.99 },
    BoostOption { key: "24_hours", hours: 24, price: 49.99 },
    BoostOption { key: "72_hours", hours: 72, price: 119.99 },
];

/// Allowed gift types.
pub const GIFT_TYPES: &[GiftType] = &[
    GiftType { id: "rose", label: "Rose", price: 4.99 },
    GiftType { id: "heart", label: "Heart", price: 9.99 },
    GiftType { id: "star", label: "Star", price: 14.99 },
    GiftType { id: "crown", label: "Crown", price: 29.99 },
];

/// Look up a boost duration by key.
pub fn boost_option(key: &str) -> Option<&'static BoostOption> {
    BOOST_OPTIONS.iter().find(|option| option.key == key)
}

/// Look up a gift type by id.
pub fn gift_type(id: &str) -> Option<&'static GiftType> {
    GIFT_TYPES.iter().find(|gift| gift.id == id)
}

/// The authoritative price for a purchase option, if it exists.
pub fn price_for(kind: PurchaseKind, option_key: &str) -> Option<f64> {
    match kind {
        PurchaseKind::Boost => boost_option(option_key).map(|option| option.price),
        PurchaseKind::Gift => gift_type(option_key).map(|gift| gift.price),
    }
}
