// SPDX-FileCopyrightText: 2026 Whisperpay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Purchase initiation: validation, server-side pricing, record creation,
//! and the signed redirect form for the bank gateway.

use std::sync::Arc;

use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::info;

use whisperpay_config::WhisperpayConfig;
use whisperpay_core::types::{PaymentRecord, PaymentStatus, PurchaseKind, RedirectForm};
use whisperpay_core::{PaymentError, PaymentStore};

use crate::{catalog, hash, TIMESTAMP_FORMAT};

/// A purchase request as parsed by the front door.
///
/// Carries no amount: the authoritative price is read from the catalog,
/// never accepted from the caller.
#[derive(Debug, Clone)]
pub struct PurchaseRequest {
    pub kind: PurchaseKind,
    pub target_id: String,
    /// Boost duration key or gift type id.
    pub option_key: String,
    pub card_number: String,
    pub expiry_month: String,
    pub expiry_year: String,
    pub cvv: String,
    pub holder_name: String,
    pub email: Option<String>,
    /// Optional message attached to a gift.
    pub gift_message: Option<String>,
    pub customer_ip: Option<String>,
}

/// Validates a purchase, fixes the price, persists the `INITIATED` record,
/// and builds the signed gateway redirect.
pub struct InitiationService {
    config: Arc<WhisperpayConfig>,
    store: Arc<dyn PaymentStore>,
}

impl InitiationService {
    pub fn new(config: Arc<WhisperpayConfig>, store: Arc<dyn PaymentStore>) -> Self {
        Self { config, store }
    }

    /// Initiate a purchase.
    ///
    /// Returns the opaque redirect descriptor the caller's browser must
    /// auto-submit to the bank; this service does not perform the redirect.
    pub async fn initiate(&self, request: &PurchaseRequest) -> Result<RedirectForm, PaymentError> {
        let merchant = &self.config.merchant;
        if merchant.client_id.trim().is_empty() || merchant.store_key.trim().is_empty() {
            return Err(PaymentError::Config(
                "merchant credentials are not configured".to_string(),
            ));
        }

        let amount = validate(request)?;

        let order_id = make_order_id(request.kind, &request.target_id);
        let record = PaymentRecord {
            order_id: order_id.clone(),
            target_id: request.target_id.clone(),
            amount,
            currency: merchant.currency.clone(),
            option_key: request.option_key.clone(),
            gift_message: request.gift_message.clone(),
            status: PaymentStatus::Initiated,
            transaction_id: None,
            auth_code: None,
            md_status: None,
            proc_return_code: None,
            error_message: None,
            raw_response: None,
            customer_ip: request.customer_ip.clone(),
            created_at: Utc::now().format(TIMESTAMP_FORMAT).to_string(),
        };
        self.store.create_payment(&record).await?;

        let fields = self.build_gateway_fields(request, &order_id, amount);
        info!(%order_id, amount, kind = %request.kind, "payment initiated");

        Ok(RedirectForm {
            action_url: merchant.gateway_url().to_string(),
            fields,
        })
    }

    /// Build the full outbound parameter set and append its signature.
    fn build_gateway_fields(
        &self,
        request: &PurchaseRequest,
        order_id: &str,
        amount: f64,
    ) -> Vec<(String, String)> {
        let merchant = &self.config.merchant;
        let callback = &self.config.callback;
        let nonce: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(20)
            .map(char::from)
            .collect();
        let (first_name, last_name) = split_holder_name(&request.holder_name);

        let mut fields: Vec<(String, String)> = vec![
            ("clientid".into(), merchant.client_id.clone()),
            ("storetype".into(), merchant.store_type.as_str().into()),
            ("islemtipi".into(), "Auth".into()),
            ("amount".into(), format!("{amount:.2}")),
            ("currency".into(), merchant.currency.clone()),
            ("oid".into(), order_id.to_string()),
            ("okUrl".into(), callback.return_url.clone()),
            ("failUrl".into(), callback.return_url.clone()),
            ("lang".into(), "en".into()),
            ("rnd".into(), nonce),
            ("hashAlgorithm".into(), "ver3".into()),
            ("pan".into(), request.card_number.clone()),
            (
                "Ecom_Payment_Card_ExpDate_Month".into(),
                format!("{:02}", request.expiry_month.parse::<u8>().unwrap_or(0)),
            ),
            (
                "Ecom_Payment_Card_ExpDate_Year".into(),
                request.expiry_year.clone(),
            ),
            ("cv2".into(), request.cvv.clone()),
            ("BillToName".into(), request.holder_name.trim().to_string()),
            ("firstName".into(), first_name),
            ("lastName".into(), last_name),
        ];
        if let Some(email) = &request.email {
            fields.push(("email".into(), email.clone()));
        }

        let signature = hash::sign(
            fields.iter().map(|(k, v)| (k.as_str(), v.as_str())),
            &merchant.store_key,
        );
        fields.push(("hash".into(), signature));
        fields
    }
}

/// Validate the purchase request and return the authoritative price.
///
/// Rejects before any record is created; the caller maps these to a
/// 4xx-equivalent response.
fn validate(request: &PurchaseRequest) -> Result<f64, PaymentError> {
    if request.target_id.trim().is_empty() {
        return Err(PaymentError::Validation("target id must not be empty".into()));
    }
    if request.card_number.len() != 16 || !request.card_number.chars().all(|c| c.is_ascii_digit()) {
        return Err(PaymentError::Validation(
            "card number must be exactly 16 digits".into(),
        ));
    }
    match request.expiry_month.parse::<u8>() {
        Ok(month) if (1..=12).contains(&month) => {}
        _ => {
            return Err(PaymentError::Validation(
                "expiry month must be between 1 and 12".into(),
            ))
        }
    }
    let year = &request.expiry_year;
    if !(2..=4).contains(&year.len()) || !year.chars().all(|c| c.is_ascii_digit()) {
        return Err(PaymentError::Validation(
            "expiry year must be 2 to 4 digits".into(),
        ));
    }
    if !(3..=4).contains(&request.cvv.len()) || !request.cvv.chars().all(|c| c.is_ascii_digit()) {
        return Err(PaymentError::Validation("cvv must be 3 or 4 digits".into()));
    }
    if request.holder_name.trim().is_empty() {
        return Err(PaymentError::Validation("cardholder name must not be empty".into()));
    }
    catalog::price_for(request.kind, &request.option_key).ok_or_else(|| {
        PaymentError::Validation(format!(
            "unknown {} option: {}",
            request.kind.to_string().to_lowercase(),
            request.option_key
        ))
    })
}

/// Generate the namespaced order id: kind prefix, 8-char target fragment,
/// millisecond timestamp. Readable for debugging, unique for correlation.
fn make_order_id(kind: PurchaseKind, target_id: &str) -> String {
    let fragment: String = target_id
        .chars()
        .filter(|c| *c != '-')
        .take(8)
        .collect();
    format!("{}{}-{}", kind.prefix(), fragment, Utc::now().timestamp_millis())
}

/// Split a cardholder name into billing first/last name parts.
fn split_holder_name(holder_name: &str) -> (String, String) {
    let trimmed = holder_name.trim();
    match trimmed.rsplit_once(' ') {
        Some((first, last)) => (first.trim().to_string(), last.to_string()),
        None => (trimmed.to_string(), String::new()),
    }
}
