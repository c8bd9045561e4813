//! Asaas payment gateway adapter.
//!
//! Implements the `PaymentGateway` port for the Asaas v3 REST API, plus a
//! stateful mock for tests.
//!
//! # Security
//!
//! - API key handled via `secrecy::SecretString` and never logged
//!
//! # Configuration
//!
//! Environment variables (see `config::GatewayConfig`):
//! - `BILLING__GATEWAY__API_URL`: API root, sandbox or production
//! - `BILLING__GATEWAY__API_KEY`: Asaas API key

mod asaas_adapter;
mod mock_gateway;
mod wire_types;

pub use asaas_adapter::{AsaasConfig, AsaasGatewayAdapter, DEFAULT_BASE_URL};
pub use mock_gateway::{MethodCall, MockPaymentGateway};
