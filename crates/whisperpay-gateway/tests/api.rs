// SPDX-FileCopyrightText: 2026 Whisperpay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Router-level tests: requests in, statuses and redirects out.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tempfile::tempdir;
use tower::ServiceExt;

use whisperpay_engine::{CallbackHandler, FulfillmentDispatcher, InitiationService};
use whisperpay_gateway::{build_router, AppState};
use whisperpay_storage::SqliteStore;

async fn app() -> (Router, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("api.db");
    let store = Arc::new(SqliteStore::open(db_path.to_str().unwrap()).await.unwrap());

    let config = Arc::new(
        whisperpay_config::load_and_validate_str(
            r#"
            [merchant]
            client_id = "100100000"
            store_key = "TEST1234"

            [callback]
            return_url = "https://app.example/v1/payments/callback"
            success_url = "https://app.example/pay/ok"
            fail_url = "https://app.example/pay/fail"
            "#,
        )
        .unwrap(),
    );

    let initiation = Arc::new(InitiationService::new(config.clone(), store.clone()));
    let dispatcher = FulfillmentDispatcher::new(store.clone());
    let callback = Arc::new(CallbackHandler::new(config, store, dispatcher).unwrap());
    (build_router(AppState { initiation, callback }), dir)
}

fn payment_json(kind: &str, option_key: &str) -> String {
    format!(
        r#"{{
            "kind": "{kind}",
            "target_id": "c0ffee00-1111-2222-3333-444455556666",
            "option_key": "{option_key}",
            "card_number": "4242424242424242",
            "expiry_month": "3",
            "expiry_year": "28",
            "cvv": "123",
            "holder_name": "Ada Lovelace"
        }}"#
    )
}

fn post_payment(body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/v1/payments")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", "203.0.113.7")
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn health_endpoint_responds() {
    let (app, _dir) = app().await;
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn payment_initiation_returns_a_signed_form() {
    let (app, _dir) = app().await;
    let response = app
        .oneshot(post_payment(payment_json("boost", "24_hours")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(json["action_url"].as_str().unwrap().contains("est3Dgate"));

    let fields = json["fields"].as_array().unwrap();
    let field = |name: &str| {
        fields
            .iter()
            .find(|f| f["name"] == name)
            .unwrap_or_else(|| panic!("missing field {name}"))["value"]
            .as_str()
            .unwrap()
            .to_string()
    };
    assert_eq!(field("amount"), "49.99");
    assert!(field("oid").starts_with("BOOST-"));
    assert!(!field("hash").is_empty());
}

#[tokio::test]
async fn unknown_kind_is_a_bad_request() {
    let (app, _dir) = app().await;
    let response = app
        .oneshot(post_payment(payment_json("refund", "24_hours")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invalid_option_is_a_bad_request() {
    let (app, _dir) = app().await;
    let response = app
        .oneshot(post_payment(payment_json("boost", "forever")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn callback_redirects_to_the_failure_page_for_unknown_orders() {
    let (app, _dir) = app().await;
    let response = app
        .oneshot(
            Request::builder()
                .uri("/v1/payments/callback?oid=BOOST-deadbeef-1714600000000&mdStatus=1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response.headers()[header::LOCATION].to_str().unwrap();
    assert_eq!(location, "https://app.example/pay/fail?error=stale");
}

#[tokio::test]
async fn callback_accepts_post_form_bodies() {
    let (app, _dir) = app().await;
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/payments/callback")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("oid=BOOST-deadbeef-1714600000000&mdStatus=1"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}
