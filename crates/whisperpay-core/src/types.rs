// SPDX-FileCopyrightText: 2026 Whisperpay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persisted domain types shared across the Whisperpay workspace.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Lifecycle state of a payment attempt.
///
/// Transitions only `Initiated -> Success` or `Initiated -> Failed`; the
/// terminal states are never left, never repeated. The string forms are the
/// persisted column values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[strum(serialize = "INITIATED")]
    Initiated,
    #[strum(serialize = "SUCCESS")]
    Success,
    #[strum(serialize = "FAILED")]
    Failed,
}

/// Kind of purchase, carried as the order-id namespace prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
pub enum PurchaseKind {
    #[strum(serialize = "BOOST")]
    Boost,
    #[strum(serialize = "GIFT")]
    Gift,
}

impl PurchaseKind {
    /// Order-id prefix for this kind, including the trailing separator.
    pub fn prefix(self) -> &'static str {
        match self {
            PurchaseKind::Boost => "BOOST-",
            PurchaseKind::Gift => "GIFT-",
        }
    }

    /// Recover the purchase kind from an order id's namespace prefix.
    pub fn from_order_id(order_id: &str) -> Option<Self> {
        if order_id.starts_with(PurchaseKind::Boost.prefix()) {
            Some(PurchaseKind::Boost)
        } else if order_id.starts_with(PurchaseKind::Gift.prefix()) {
            Some(PurchaseKind::Gift)
        } else {
            None
        }
    }
}

/// One row per purchase attempt.
///
/// `order_id`, `amount`, and `currency` are immutable after creation; the
/// bank-supplied fields stay `None` until the callback finalizes the record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    /// Globally unique order id: `BOOST-`/`GIFT-` prefix, target fragment,
    /// millisecond creation timestamp.
    pub order_id: String,
    /// Id of the confession being boosted or gifted.
    pub target_id: String,
    /// Authoritative amount, fixed from the price table at creation.
    pub amount: f64,
    /// ISO 4217 numeric currency code (e.g. "949").
    pub currency: String,
    /// Purchase option key: boost duration key or gift type id.
    pub option_key: String,
    /// Optional gift message captured at initiation, attached at fulfillment.
    pub gift_message: Option<String>,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub auth_code: Option<String>,
    pub md_status: Option<String>,
    pub proc_return_code: Option<String>,
    pub error_message: Option<String>,
    /// Full callback parameter payload, retained for audit.
    pub raw_response: Option<String>,
    pub customer_ip: Option<String>,
    /// ISO 8601 creation timestamp.
    pub created_at: String,
}

/// Terminal outcome applied to a payment record by the callback handler.
///
/// Written in a single atomic update keyed by order id; see
/// [`crate::traits::PaymentStore::finalize_payment`].
#[derive(Debug, Clone)]
pub struct PaymentOutcome {
    /// `Success` or `Failed`; never `Initiated`.
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub auth_code: Option<String>,
    pub md_status: Option<String>,
    pub proc_return_code: Option<String>,
    /// Internal failure reason, retained for audit on `Failed` outcomes.
    pub error_message: Option<String>,
    /// Full callback parameter map, serialized for audit.
    pub raw_response: String,
}

/// A paid visibility boost applied to a confession.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Boost {
    pub target_id: String,
    pub order_id: String,
    pub duration_key: String,
    /// ISO 8601 expiry timestamp.
    pub ends_at: String,
}

/// A paid gift credit attributed to a confession.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gift {
    pub target_id: String,
    pub gift_type_id: String,
    pub message: Option<String>,
    /// Order id of the payment that funded this gift.
    pub order_id: String,
}

/// Purchased effect resolved from a successful payment.
///
/// Applied together with the status claim in one storage transaction; see
/// [`crate::traits::FulfillmentStore::finalize_and_apply`].
#[derive(Debug, Clone)]
pub enum FulfillmentEffect {
    Boost(Boost),
    Gift { gift: Gift, value: f64 },
}

/// Opaque redirect descriptor for the bank gateway hop.
///
/// The caller renders this as an auto-submitting HTML form; the engine never
/// performs the redirect itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedirectForm {
    /// Bank gateway URL the form posts to.
    pub action_url: String,
    /// Form fields in submission order, signature included.
    pub fields: Vec<(String, String)>,
}
