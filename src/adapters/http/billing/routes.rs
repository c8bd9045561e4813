//! Axum router configuration for billing endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    cancel_subscription, create_charge, create_customer, create_invoice, create_subscription,
    get_charge, get_customer, get_invoice, get_subscription, handle_gateway_webhook,
    BillingAppState,
};

/// Create the billing API router.
///
/// # Routes
///
/// - `POST /customers`, `GET /customers/:id`
/// - `POST /charges`, `GET /charges/:id`
/// - `POST /subscriptions`, `GET /subscriptions/:id`, `POST /subscriptions/:id/cancel`
/// - `POST /invoices`, `GET /invoices/:id`
pub fn billing_routes() -> Router<BillingAppState> {
    Router::new()
        .route("/customers", post(create_customer))
        .route("/customers/:id", get(get_customer))
        .route("/charges", post(create_charge))
        .route("/charges/:id", get(get_charge))
        .route("/subscriptions", post(create_subscription))
        .route("/subscriptions/:id", get(get_subscription))
        .route("/subscriptions/:id/cancel", post(cancel_subscription))
        .route("/invoices", post(create_invoice))
        .route("/invoices/:id", get(get_invoice))
}

/// Create the gateway webhook router.
///
/// Authenticated by the `asaas-access-token` header rather than by caller
/// identity.
pub fn webhook_routes() -> Router<BillingAppState> {
    Router::new().route("/asaas", post(handle_gateway_webhook))
}

/// Create the complete billing router.
///
/// ```ignore
/// let app = billing_router().with_state(state);
/// ```
pub fn billing_router() -> Router<BillingAppState> {
    Router::new()
        .merge(billing_routes())
        .nest("/webhooks", webhook_routes())
}
