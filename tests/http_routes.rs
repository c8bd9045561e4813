//! Integration tests for the billing HTTP surface.
//!
//! Requests go through the full axum router with `tower::ServiceExt::oneshot`,
//! backed by the in-memory store and the mock gateway.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use secrecy::SecretString;
use serde_json::{json, Value};
use tower::ServiceExt;

use billing_bridge::adapters::http::billing::WEBHOOK_TOKEN_HEADER;
use billing_bridge::adapters::http::{billing_router, BillingAppState};
use billing_bridge::adapters::{InMemoryBillingStore, MockPaymentGateway};
use billing_bridge::domain::billing::InvoiceDefaults;

const TOKEN: &str = "whk-test-token";

// =============================================================================
// Test Infrastructure
// =============================================================================

fn app() -> Router {
    let store = Arc::new(InMemoryBillingStore::new());
    let state = BillingAppState::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store,
        Arc::new(MockPaymentGateway::new()),
        InvoiceDefaults::default(),
        SecretString::new(TOKEN.to_string()),
    );
    billing_router().with_state(state)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn webhook(token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::post("/webhooks/asaas").header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header(WEBHOOK_TOKEN_HEADER, token);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn create_customer(app: &Router) -> String {
    let (status, body) = send(
        app,
        post(
            "/customers",
            json!({"name": "Maria Souza", "cpf_cnpj": "24971563792", "email": "maria@example.com"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

async fn create_charge(app: &Router, customer_id: &str) -> Value {
    let (status, body) = send(
        app,
        post(
            "/charges",
            json!({
                "customer_id": customer_id,
                "billing_type": "BOLETO",
                "value": 150.0,
                "due_date": "2025-01-10"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "body: {}", body);
    body
}

// =============================================================================
// Create and read
// =============================================================================

#[tokio::test]
async fn customer_and_charge_are_created_and_readable() {
    let app = app();
    let customer_id = create_customer(&app).await;

    let charge = create_charge(&app, &customer_id).await;
    assert_eq!(charge["status"], "PENDING");
    assert_eq!(charge["remote_id"], "gw-pay-2");
    assert_eq!(charge["customer_id"], customer_id.as_str());

    let uri = format!("/charges/{}", charge["id"].as_str().unwrap());
    let (status, body) = send(&app, get(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["remote_id"], "gw-pay-2");

    let (status, body) = send(&app, get(&format!("/customers/{}", customer_id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["remote_id"], "gw-cus-1");
}

#[tokio::test]
async fn unknown_records_return_404_with_error_code() {
    let app = app();

    let (status, body) = send(&app, get("/charges/missing")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "CHARGE_NOT_FOUND");

    let (status, body) = send(&app, get("/invoices/missing")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "INVOICE_NOT_FOUND");
}

#[tokio::test]
async fn charge_for_unknown_customer_is_404() {
    let app = app();
    let (status, body) = send(
        &app,
        post(
            "/charges",
            json!({
                "customer_id": "nobody",
                "billing_type": "PIX",
                "value": 10.0,
                "due_date": "2025-01-10"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "CUSTOMER_NOT_FOUND");
}

#[tokio::test]
async fn invalid_customer_is_400() {
    let app = app();
    let (status, body) = send(
        &app,
        post("/customers", json!({"name": " ", "cpf_cnpj": "24971563792"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "EMPTY_FIELD");
}

#[tokio::test]
async fn subscription_can_be_created_and_cancelled() {
    let app = app();
    let customer_id = create_customer(&app).await;

    let (status, subscription) = send(
        &app,
        post(
            "/subscriptions",
            json!({
                "customer_id": customer_id,
                "billing_type": "PIX",
                "value": 49.9,
                "cycle": "MONTHLY",
                "next_due_date": "2025-02-01"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(subscription["status"], "ACTIVE");

    let uri = format!("/subscriptions/{}/cancel", subscription["id"].as_str().unwrap());
    let (status, body) = send(&app, post(&uri, json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "INACTIVE");
}

// =============================================================================
// Webhook endpoint
// =============================================================================

#[tokio::test]
async fn webhook_without_valid_token_is_401() {
    let app = app();
    let body = json!({"event": "PAYMENT_CREATED", "payment": {}});

    let (status, _) = send(&app, webhook(None, body.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, webhook(Some("wrong"), body)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn webhook_with_unknown_event_is_400() {
    let app = app();
    let (status, body) = send(&app, webhook(Some(TOKEN), json!({"event": "SOMETHING_UNKNOWN"}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "UNSUPPORTED_EVENT");
}

#[tokio::test]
async fn webhook_with_unparseable_body_is_400() {
    let app = app();
    let request = Request::post("/webhooks/asaas")
        .header(WEBHOOK_TOKEN_HEADER, TOKEN)
        .body(Body::from("not json"))
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "MALFORMED_PAYLOAD");
}

#[tokio::test]
async fn received_payment_issues_invoice_once() {
    let app = app();
    let customer_id = create_customer(&app).await;
    let charge = create_charge(&app, &customer_id).await;
    let charge_id = charge["id"].as_str().unwrap();

    let notice = json!({
        "event": "PAYMENT_RECEIVED",
        "payment": {"externalReference": charge_id, "status": "RECEIVED"}
    });

    let (status, body) = send(&app, webhook(Some(TOKEN), notice.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "charge_synced_invoice_issued");

    let (status, body) = send(&app, webhook(Some(TOKEN), notice)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "charge_synced");

    let (_, charge) = send(&app, get(&format!("/charges/{}", charge_id))).await;
    assert_eq!(charge["status"], "RECEIVED");

    // A manual invoice for the same charge is refused
    let (status, body) = send(
        &app,
        post(
            "/invoices",
            json!({
                "charge_id": charge_id,
                "details": {
                    "service_description": "Consulting",
                    "observations": "n/a",
                    "value": 150.0,
                    "deductions": 0.0,
                    "effective_date": "2025-01-10",
                    "municipal_service_code": "01.03.01",
                    "municipal_service_name": "Consulting",
                    "update_payment": false,
                    "taxes": {
                        "retain_iss": false,
                        "cofins": 0.0, "csll": 0.0, "inss": 0.0,
                        "ir": 0.0, "pis": 0.0, "iss": 5.0
                    }
                }
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INVOICE_ALREADY_ISSUED");
}
