//! PostgreSQL adapters - the local system of record.
//!
//! One repository per aggregate, all sharing a single `PgPool`:
//! - `PostgresCustomerRepository`
//! - `PostgresChargeRepository`
//! - `PostgresSubscriptionRepository`
//! - `PostgresInvoiceRepository`
//!
//! Schema lives in `migrations/`; `MIGRATOR` applies it at startup.

mod charge_repository;
mod common;
mod customer_repository;
mod invoice_repository;
mod subscription_repository;

pub use charge_repository::PostgresChargeRepository;
pub use customer_repository::PostgresCustomerRepository;
pub use invoice_repository::PostgresInvoiceRepository;
pub use subscription_repository::PostgresSubscriptionRepository;

/// Embedded schema migrations.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
