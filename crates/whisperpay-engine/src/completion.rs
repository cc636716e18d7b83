// SPDX-FileCopyrightText: 2026 Whisperpay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Server-to-server gateway completion client.
//!
//! Merchants in `3d` store mode must confirm the charge after the browser
//! redirect: the 3-D proof fields from the callback are posted to the bank's
//! API endpoint as a CC5-style request, and the reply decides the outcome.
//! Any transport failure or unparsable reply is a completion failure
//! surfaced to the caller, never a crash.

use std::time::Duration;

use tracing::{debug, warn};

use whisperpay_config::MerchantConfig;
use whisperpay_core::PaymentError;

/// Request timeout for the completion call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// 3-D proof fields forwarded from the callback.
#[derive(Debug, Clone)]
pub struct CompletionRequest<'a> {
    pub order_id: &'a str,
    pub amount: f64,
    pub currency: &'a str,
    /// Correlation id (`xid`) assigned by the gateway during the redirect.
    pub xid: &'a str,
    /// Authentication-strength indicator (`eci`).
    pub eci: &'a str,
    /// Authentication signature (`cavv`).
    pub cavv: &'a str,
}

/// Parsed outcome of the completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResult {
    /// Approval flag and "no error" return code both present.
    pub approved: bool,
    pub proc_return_code: String,
    pub transaction_id: Option<String>,
    pub auth_code: Option<String>,
    pub error_message: Option<String>,
}

/// HTTP client for the bank's merchant API endpoint.
#[derive(Debug, Clone)]
pub struct CompletionClient {
    client: reqwest::Client,
    api_url: String,
    client_id: String,
    api_username: String,
    api_password: String,
}

impl CompletionClient {
    /// Build a client from the merchant configuration.
    ///
    /// Fails when the API credentials required for the completion call are
    /// not configured.
    pub fn new(merchant: &MerchantConfig) -> Result<Self, PaymentError> {
        let api_username = merchant
            .api_username
            .clone()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| PaymentError::Config("merchant.api_username is not set".into()))?;
        let api_password = merchant
            .api_password
            .clone()
            .filter(|password| !password.is_empty())
            .ok_or_else(|| PaymentError::Config("merchant.api_password is not set".into()))?;

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PaymentError::Completion {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            api_url: merchant.api_url().to_string(),
            client_id: merchant.client_id.clone(),
            api_username,
            api_password,
        })
    }

    /// Override the API URL (for testing with wiremock).
    #[cfg(test)]
    pub fn with_api_url(mut self, url: String) -> Self {
        self.api_url = url;
        self
    }

    /// Send the completion request and parse the bank's reply.
    ///
    /// Retries once on a transport failure (connect error, timeout, 5xx);
    /// an explicit decline is returned as-is, never retried.
    pub async fn complete(
        &self,
        request: &CompletionRequest<'_>,
    ) -> Result<CompletionResult, PaymentError> {
        let body = self.build_request_body(request);
        let mut last_error: Option<PaymentError> = None;

        for attempt in 0..=1u32 {
            if attempt > 0 {
                warn!(order_id = request.order_id, "retrying completion call");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = match self
                .client
                .post(&self.api_url)
                .form(&[("DATA", body.as_str())])
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    last_error = Some(PaymentError::Completion {
                        message: format!("completion request failed: {e}"),
                        source: Some(Box::new(e)),
                    });
                    continue;
                }
            };

            let status = response.status();
            debug!(order_id = request.order_id, status = %status, attempt, "completion response");

            if status.is_server_error() {
                last_error = Some(PaymentError::Completion {
                    message: format!("bank API returned {status}"),
                    source: None,
                });
                continue;
            }
            if !status.is_success() {
                return Err(PaymentError::Completion {
                    message: format!("bank API returned {status}"),
                    source: None,
                });
            }

            let text = response.text().await.map_err(|e| PaymentError::Completion {
                message: format!("failed to read completion response: {e}"),
                source: Some(Box::new(e)),
            })?;
            return decode_response(&text);
        }

        Err(last_error.unwrap_or_else(|| PaymentError::Completion {
            message: "completion call failed".into(),
            source: None,
        }))
    }

    /// Build the CC5-style XML request carrying the 3-D proof fields.
    fn build_request_body(&self, request: &CompletionRequest<'_>) -> String {
        format!(
            "<CC5Request>\
             <Name>{}</Name>\
             <Password>{}</Password>\
             <ClientId>{}</ClientId>\
             <Type>Auth</Type>\
             <OrderId>{}</OrderId>\
             <Total>{:.2}</Total>\
             <Currency>{}</Currency>\
             <PayerTxnId>{}</PayerTxnId>\
             <PayerSecurityLevel>{}</PayerSecurityLevel>\
             <PayerAuthenticationCode>{}</PayerAuthenticationCode>\
             </CC5Request>",
            escape_xml(&self.api_username),
            escape_xml(&self.api_password),
            escape_xml(&self.client_id),
            escape_xml(request.order_id),
            request.amount,
            escape_xml(request.currency),
            escape_xml(request.xid),
            escape_xml(request.eci),
            escape_xml(request.cavv),
        )
    }
}

/// Decode the bank's CC5-style reply into a fixed result structure.
///
/// Fails closed: a reply missing the approval flag or the return code is a
/// completion failure, never silently defaulted.
fn decode_response(xml: &str) -> Result<CompletionResult, PaymentError> {
    let response = element_text(xml, "Response").ok_or_else(|| PaymentError::Completion {
        message: "completion response is missing the Response element".into(),
        source: None,
    })?;
    let proc_return_code =
        element_text(xml, "ProcReturnCode").ok_or_else(|| PaymentError::Completion {
            message: "completion response is missing the ProcReturnCode element".into(),
            source: None,
        })?;

    Ok(CompletionResult {
        approved: response == "Approved" && proc_return_code == "00",
        proc_return_code,
        transaction_id: element_text(xml, "TransId"),
        auth_code: element_text(xml, "AuthCode"),
        error_message: element_text(xml, "ErrMsg"),
    })
}

/// Extract and unescape the text content of the first `<tag>...</tag>`.
fn element_text(xml: &str, tag: &str) -> Option<String> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let start = xml.find(&open)? + open.len();
    let end = xml[start..].find(&close)? + start;
    let text = xml[start..end].trim();
    if text.is_empty() {
        None
    } else {
        Some(unescape_xml(text))
    }
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn unescape_xml(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
