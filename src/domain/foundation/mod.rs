//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers and error types
//! that form the vocabulary of the billing domain.

mod errors;
mod ids;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{ChargeId, Correlation, CustomerId, GatewayId, InvoiceId, SubscriptionId};
pub use timestamp::Timestamp;
