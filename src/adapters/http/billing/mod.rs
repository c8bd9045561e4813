//! HTTP adapter for billing endpoints.
//!
//! - `POST /customers`, `GET /customers/:id`
//! - `POST /charges`, `GET /charges/:id`
//! - `POST /subscriptions`, `GET /subscriptions/:id`, `POST /subscriptions/:id/cancel`
//! - `POST /invoices`, `GET /invoices/:id`
//! - `POST /webhooks/asaas` - gateway notifications

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;
pub use handlers::{ApiError, BillingAppState, WEBHOOK_TOKEN_HEADER};
pub use routes::{billing_router, billing_routes, webhook_routes};
