// SPDX-FileCopyrightText: 2026 Whisperpay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the payment API.
//!
//! Handles POST /v1/payments, the GET/POST bank callback, and GET /health.

use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Form, Json};
use serde::{Deserialize, Serialize};

use whisperpay_core::types::{PurchaseKind, RedirectForm};
use whisperpay_core::PaymentError;
use whisperpay_engine::PurchaseRequest;

use crate::server::AppState;

/// Request body for POST /v1/payments.
#[derive(Debug, Deserialize)]
pub struct PaymentRequestBody {
    /// "boost" or "gift".
    pub kind: String,
    /// Id of the confession to boost or gift.
    pub target_id: String,
    /// Boost duration key or gift type id. The price is never part of the
    /// request; it is fixed server-side from the option.
    pub option_key: String,
    pub card_number: String,
    pub expiry_month: String,
    pub expiry_year: String,
    pub cvv: String,
    pub holder_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub gift_message: Option<String>,
}

/// Response body for POST /v1/payments: the form the browser auto-submits
/// to the bank gateway.
#[derive(Debug, Serialize)]
pub struct PaymentResponseBody {
    /// Bank gateway URL the form posts to.
    pub action_url: String,
    /// Form fields in submission order, signature included.
    pub fields: Vec<FormField>,
}

/// One field of the gateway redirect form.
#[derive(Debug, Serialize)]
pub struct FormField {
    pub name: String,
    pub value: String,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// POST /v1/payments
///
/// Validates the purchase, persists the pending record, and returns the
/// signed redirect form for the bank gateway hop.
pub async fn post_payment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<PaymentRequestBody>,
) -> Response {
    let Some(kind) = parse_kind(&body.kind) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!("unknown purchase kind: {}", body.kind),
        );
    };

    let request = PurchaseRequest {
        kind,
        target_id: body.target_id,
        option_key: body.option_key,
        card_number: body.card_number,
        expiry_month: body.expiry_month,
        expiry_year: body.expiry_year,
        cvv: body.cvv,
        holder_name: body.holder_name,
        email: body.email,
        gift_message: body.gift_message,
        customer_ip: client_ip(&headers),
    };

    match state.initiation.initiate(&request).await {
        Ok(form) => (StatusCode::OK, Json(redirect_body(form))).into_response(),
        Err(e) => payment_error_response(e),
    }
}

/// GET /v1/payments/callback
pub async fn get_callback(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Redirect {
    callback(&state, &params).await
}

/// POST /v1/payments/callback
pub async fn post_callback(
    State(state): State<AppState>,
    Form(params): Form<HashMap<String, String>>,
) -> Redirect {
    callback(&state, &params).await
}

/// GET /health
pub async fn get_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Both callback transports end here; the engine decides the redirect.
async fn callback(state: &AppState, params: &HashMap<String, String>) -> Redirect {
    let result = state.callback.process(params).await;
    Redirect::to(result.redirect_url())
}

fn parse_kind(kind: &str) -> Option<PurchaseKind> {
    match kind {
        "boost" => Some(PurchaseKind::Boost),
        "gift" => Some(PurchaseKind::Gift),
        _ => None,
    }
}

/// First address in `x-forwarded-for`, if present.
fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn redirect_body(form: RedirectForm) -> PaymentResponseBody {
    PaymentResponseBody {
        action_url: form.action_url,
        fields: form
            .fields
            .into_iter()
            .map(|(name, value)| FormField { name, value })
            .collect(),
    }
}

/// Map engine errors onto HTTP statuses without leaking internals.
fn payment_error_response(error: PaymentError) -> Response {
    match error {
        PaymentError::Validation(message) => error_response(StatusCode::BAD_REQUEST, message),
        PaymentError::Config(_) => error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "payment service is not configured".to_string(),
        ),
        _ => {
            tracing::error!(error = %error, "payment initiation failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal error".to_string(),
            )
        }
    }
}

fn error_response(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}
