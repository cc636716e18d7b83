// SPDX-FileCopyrightText: 2026 Whisperpay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Asynchronous bank callback processing.
//!
//! The bank may deliver the callback via POST form fields or GET query
//! parameters, and may deliver it more than once. Both transports feed the
//! same [`CallbackHandler::process`] function, so the two entry points can
//! never diverge. The INITIATED-only atomic claim in the store makes the
//! terminal transition happen exactly once per order, no matter how many
//! deliveries race.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{error, info, warn};

use whisperpay_config::WhisperpayConfig;
use whisperpay_core::types::{PaymentOutcome, PaymentRecord, PaymentStatus};
use whisperpay_core::{PaymentError, PaymentStore};

use crate::completion::{CompletionClient, CompletionRequest};
use crate::fulfill::FulfillmentDispatcher;
use crate::hash;

/// Coarse, non-sensitive error tokens carried on failure redirects.
///
/// Raw bank codes and internal reasons never leave the server; the browser
/// only ever sees one of these.
pub mod tokens {
    pub const ORDER_MISSING: &str = "order-missing";
    pub const STALE: &str = "stale";
    pub const INVALID_SIGNATURE: &str = "invalid-signature";
    pub const AMOUNT_MISMATCH: &str = "amount-mismatch";
    pub const AUTH_DECLINED: &str = "auth-declined";
    pub const PAYMENT_FAILED: &str = "payment-failed";
    pub const PROCESSING_ERROR: &str = "processing-error";
}

/// Browser redirect decided by callback processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackResult {
    Success { redirect_url: String },
    Failure { redirect_url: String, token: &'static str },
}

impl CallbackResult {
    /// The URL the browser is sent to.
    pub fn redirect_url(&self) -> &str {
        match self {
            CallbackResult::Success { redirect_url } => redirect_url,
            CallbackResult::Failure { redirect_url, .. } => redirect_url,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CallbackResult::Success { .. })
    }
}

/// Verifies and finalizes bank callbacks, then triggers fulfillment.
#[derive(Clone)]
pub struct CallbackHandler {
    config: Arc<WhisperpayConfig>,
    store: Arc<dyn PaymentStore>,
    fulfillment: FulfillmentDispatcher,
    completion: Option<CompletionClient>,
}

impl CallbackHandler {
    /// Build the handler. The completion client is only constructed for
    /// merchant modes that require the server-to-server confirmation call.
    pub fn new(
        config: Arc<WhisperpayConfig>,
        store: Arc<dyn PaymentStore>,
        fulfillment: FulfillmentDispatcher,
    ) -> Result<Self, PaymentError> {
        let completion = if config.merchant.store_type.requires_completion() {
            Some(CompletionClient::new(&config.merchant)?)
        } else {
            None
        };
        Ok(Self {
            config,
            store,
            fulfillment,
            completion,
        })
    }

    /// Process one callback delivery, however it was transported.
    ///
    /// Never fails outward: internal errors collapse to a generic failure
    /// redirect so the browser always lands somewhere sensible.
    pub async fn process(&self, params: &HashMap<String, String>) -> CallbackResult {
        match self.run(params).await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "callback processing error");
                self.failure(tokens::PROCESSING_ERROR)
            }
        }
    }

    async fn run(&self, params: &HashMap<String, String>) -> Result<CallbackResult, PaymentError> {
        let Some(order_id) = param(params, "oid").or_else(|| param(params, "ReturnOid")) else {
            warn!("callback carries no order id");
            return Ok(self.failure(tokens::ORDER_MISSING));
        };

        let Some(record) = self.store.get_payment(order_id).await? else {
            warn!(order_id, "callback for unknown order");
            let stale = PaymentError::StaleCallback {
                order_id: order_id.to_string(),
            };
            return Ok(self.failure(token_for(&stale)));
        };
        if record.status != PaymentStatus::Initiated {
            info!(order_id, status = %record.status, "duplicate callback for finalized order");
            let stale = PaymentError::StaleCallback {
                order_id: order_id.to_string(),
            };
            return Ok(self.failure(token_for(&stale)));
        }

        let raw_response = serde_json::to_string(params)
            .map_err(|e| PaymentError::Internal(format!("failed to serialize callback: {e}")))?;

        // Steps 3-5: signature, amount, 3-D authentication status.
        if let Err(e) = self.verify_delivery(&record, params) {
            warn!(order_id = %record.order_id, error = %e, "callback rejected");
            return self
                .finalize(
                    &record,
                    failed_outcome(params, &e.to_string(), raw_response),
                    token_for(&e),
                )
                .await;
        }

        // Resolve the charge outcome: completion call for `3d` merchants,
        // the callback's own outcome fields otherwise.
        let (outcome, token) = match &self.completion {
            Some(client) => self.completed_outcome(client, &record, params, raw_response).await,
            None => direct_outcome(params, raw_response),
        };

        self.finalize(&record, outcome, token).await
    }

    /// Reject the delivery unless the signature, the amount, and the 3-D
    /// authentication status all check out against the stored record.
    fn verify_delivery(
        &self,
        record: &PaymentRecord,
        params: &HashMap<String, String>,
    ) -> Result<(), PaymentError> {
        let supplied = param(params, "HASH")
            .or_else(|| param(params, "hash"))
            .unwrap_or("");
        let entries = params.iter().map(|(k, v)| (k.as_str(), v.as_str()));
        if !hash::verify(entries, &self.config.merchant.store_key, supplied) {
            return Err(PaymentError::HashMismatch {
                order_id: record.order_id.clone(),
            });
        }

        let reported = param(params, "amount")
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(f64::NAN);
        if !((reported - record.amount).abs() <= self.config.callback.amount_epsilon) {
            return Err(PaymentError::AmountMismatch {
                order_id: record.order_id.clone(),
                stored: record.amount,
                reported,
            });
        }

        let md_status = param(params, "mdStatus").unwrap_or("");
        if !self
            .config
            .callback
            .accepted_md_statuses
            .iter()
            .any(|accepted| accepted == md_status)
        {
            return Err(PaymentError::AuthenticationRejected {
                md_status: md_status.to_string(),
            });
        }

        Ok(())
    }

    /// Run the server-to-server confirmation and map its result.
    async fn completed_outcome(
        &self,
        client: &CompletionClient,
        record: &PaymentRecord,
        params: &HashMap<String, String>,
        raw_response: String,
    ) -> (PaymentOutcome, &'static str) {
        let request = CompletionRequest {
            order_id: &record.order_id,
            amount: record.amount,
            currency: &record.currency,
            xid: param(params, "xid").unwrap_or(""),
            eci: param(params, "eci").unwrap_or(""),
            cavv: param(params, "cavv").unwrap_or(""),
        };
        match client.complete(&request).await {
            Ok(result) if result.approved => (
                PaymentOutcome {
                    status: PaymentStatus::Success,
                    transaction_id: result.transaction_id,
                    auth_code: result.auth_code,
                    md_status: param(params, "mdStatus").map(str::to_string),
                    proc_return_code: Some(result.proc_return_code),
                    error_message: None,
                    raw_response,
                },
                tokens::PAYMENT_FAILED,
            ),
            Ok(result) => {
                info!(
                    order_id = %record.order_id,
                    proc_return_code = %result.proc_return_code,
                    "completion declined"
                );
                (
                    PaymentOutcome {
                        status: PaymentStatus::Failed,
                        transaction_id: result.transaction_id,
                        auth_code: result.auth_code,
                        md_status: param(params, "mdStatus").map(str::to_string),
                        proc_return_code: Some(result.proc_return_code),
                        error_message: result
                            .error_message
                            .or_else(|| Some("completion declined".to_string())),
                        raw_response,
                    },
                    tokens::PAYMENT_FAILED,
                )
            }
            Err(e) => {
                error!(order_id = %record.order_id, error = %e, "completion call failed");
                (
                    failed_outcome(params, "completion call failed", raw_response),
                    tokens::PAYMENT_FAILED,
                )
            }
        }
    }

    /// Atomically finalize the record: on success the status claim and the
    /// fulfillment effect commit as one storage transaction, so an effect
    /// write failure rolls the claim back and surfaces as an error here,
    /// leaving the record `INITIATED` for the bank's redelivery.
    async fn finalize(
        &self,
        record: &PaymentRecord,
        outcome: PaymentOutcome,
        failure_token: &'static str,
    ) -> Result<CallbackResult, PaymentError> {
        let claimed = if outcome.status == PaymentStatus::Success {
            self.fulfillment.finalize_success(record, &outcome).await?
        } else {
            self.store.finalize_payment(&record.order_id, &outcome).await?
        };
        if !claimed {
            // A concurrent delivery won the claim between our read and this
            // update; treat this one as the duplicate it is.
            info!(order_id = %record.order_id, "lost finalization race to a concurrent callback");
            return Ok(self.failure(tokens::STALE));
        }

        if outcome.status == PaymentStatus::Success {
            info!(order_id = %record.order_id, "payment succeeded");
            Ok(CallbackResult::Success {
                redirect_url: self.config.callback.success_url.clone(),
            })
        } else {
            info!(
                order_id = %record.order_id,
                reason = outcome.error_message.as_deref().unwrap_or(""),
                "payment failed"
            );
            Ok(self.failure(failure_token))
        }
    }

    fn failure(&self, token: &'static str) -> CallbackResult {
        CallbackResult::Failure {
            redirect_url: format!("{}?error={}", self.config.callback.fail_url, token),
            token,
        }
    }
}

/// Coarse redirect token for a callback-path error. Raw bank codes and
/// internal reasons stay server-side.
fn token_for(error: &PaymentError) -> &'static str {
    match error {
        PaymentError::HashMismatch { .. } => tokens::INVALID_SIGNATURE,
        PaymentError::AmountMismatch { .. } => tokens::AMOUNT_MISMATCH,
        PaymentError::AuthenticationRejected { .. } => tokens::AUTH_DECLINED,
        PaymentError::StaleCallback { .. } => tokens::STALE,
        PaymentError::Completion { .. } => tokens::PAYMENT_FAILED,
        _ => tokens::PROCESSING_ERROR,
    }
}

/// Case-sensitive parameter lookup returning a borrowed value.
fn param<'a>(params: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    params.get(key).map(String::as_str).filter(|v| !v.is_empty())
}

/// Outcome for modes that trust the gateway's own redirect fields.
fn direct_outcome(
    params: &HashMap<String, String>,
    raw_response: String,
) -> (PaymentOutcome, &'static str) {
    let response = param(params, "Response").unwrap_or("");
    let proc_return_code = param(params, "ProcReturnCode").unwrap_or("");
    let approved = response == "Approved" && proc_return_code == "00";

    let outcome = PaymentOutcome {
        status: if approved {
            PaymentStatus::Success
        } else {
            PaymentStatus::Failed
        },
        transaction_id: param(params, "TransId").map(str::to_string),
        auth_code: param(params, "AuthCode").map(str::to_string),
        md_status: param(params, "mdStatus").map(str::to_string),
        proc_return_code: param(params, "ProcReturnCode").map(str::to_string),
        error_message: if approved {
            None
        } else {
            Some(format!("bank declined (Response {response}, ProcReturnCode {proc_return_code})"))
        },
        raw_response,
    };
    (outcome, tokens::PAYMENT_FAILED)
}

/// Failed outcome retaining the bank fields and an internal reason.
fn failed_outcome(
    params: &HashMap<String, String>,
    reason: &str,
    raw_response: String,
) -> PaymentOutcome {
    PaymentOutcome {
        status: PaymentStatus::Failed,
        transaction_id: param(params, "TransId").map(str::to_string),
        auth_code: param(params, "AuthCode").map(str::to_string),
        md_status: param(params, "mdStatus").map(str::to_string),
        proc_return_code: param(params, "ProcReturnCode").map(str::to_string),
        error_message: Some(reason.to_string()),
        raw_response,
    }
}
