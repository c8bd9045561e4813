//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `asaas` - Asaas payment gateway (REST client and test double)
//! - `memory` - in-memory system of record
//! - `postgres` - PostgreSQL system of record
//! - `http` - axum REST surface and webhook endpoint

pub mod asaas;
pub mod http;
pub mod memory;
pub mod postgres;

pub use asaas::{AsaasConfig, AsaasGatewayAdapter, MockPaymentGateway};
pub use memory::InMemoryBillingStore;
pub use postgres::{
    PostgresChargeRepository, PostgresCustomerRepository, PostgresInvoiceRepository,
    PostgresSubscriptionRepository,
};
