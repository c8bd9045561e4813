//! Billing error types.
//!
//! One taxonomy serves both the creation flows and the webhook pipeline.
//! Errors bubble to the request boundary unchanged; the only silent cases
//! (unmatched correlation, out-of-scope subscription) never become errors.

use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode, ValidationError};

use super::gateway_error::GatewayError;

#[derive(Debug, Clone, Error)]
pub enum BillingError {
    /// Caller input failed value-object validation.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A referenced local record does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// The gateway has no object for the given correlation.
    #[error("{entity} with reference {reference} not found on gateway")]
    RemoteNotFound {
        entity: &'static str,
        reference: String,
    },

    /// Event type outside the declared closed set.
    #[error("Unsupported event type: {0}")]
    UnsupportedEvent(String),

    /// Notification body missing a required part.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// Gateway call failed; carried verbatim.
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// One side of a dual write succeeded and the other did not.
    #[error("Consistency gap on {entity} {local_id} (gateway id {remote_id}): {reason}")]
    ConsistencyGap {
        entity: &'static str,
        local_id: String,
        remote_id: String,
        reason: String,
    },

    /// The store already holds an invoice for this charge.
    #[error("Invoice already issued for charge {charge_id}")]
    InvoiceAlreadyIssued { charge_id: String },

    #[error("Infrastructure error: {0}")]
    Infrastructure(String),
}

impl BillingError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        BillingError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn remote_not_found(entity: &'static str, reference: impl ToString) -> Self {
        BillingError::RemoteNotFound {
            entity,
            reference: reference.to_string(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        BillingError::MalformedPayload(message.into())
    }

    pub fn consistency_gap(
        entity: &'static str,
        local_id: impl ToString,
        remote_id: impl ToString,
        reason: impl ToString,
    ) -> Self {
        BillingError::ConsistencyGap {
            entity,
            local_id: local_id.to_string(),
            remote_id: remote_id.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Validation-class errors are surfaced immediately and never retried.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            BillingError::Validation(_)
                | BillingError::UnsupportedEvent(_)
                | BillingError::MalformedPayload(_)
        )
    }

    /// Whether redelivering the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            BillingError::Gateway(err) => err.is_retryable(),
            BillingError::ConsistencyGap { .. } | BillingError::Infrastructure(_) => true,
            _ => false,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            BillingError::Validation(ValidationError::EmptyField { .. }) => ErrorCode::EmptyField,
            BillingError::Validation(ValidationError::InvalidFormat { .. }) => {
                ErrorCode::InvalidFormat
            }
            BillingError::Validation(_) => ErrorCode::ValidationFailed,
            BillingError::NotFound { entity, .. } => match *entity {
                "customer" => ErrorCode::CustomerNotFound,
                "charge" => ErrorCode::ChargeNotFound,
                "subscription" => ErrorCode::SubscriptionNotFound,
                "invoice" => ErrorCode::InvoiceNotFound,
                _ => ErrorCode::InternalError,
            },
            BillingError::RemoteNotFound { .. } => ErrorCode::RemoteNotFound,
            BillingError::UnsupportedEvent(_) => ErrorCode::UnsupportedEvent,
            BillingError::MalformedPayload(_) => ErrorCode::MalformedPayload,
            BillingError::Gateway(_) => ErrorCode::GatewayError,
            BillingError::ConsistencyGap { .. } => ErrorCode::ConsistencyGap,
            BillingError::InvoiceAlreadyIssued { .. } => ErrorCode::InvoiceAlreadyIssued,
            BillingError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }
}

impl From<DomainError> for BillingError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::InvoiceAlreadyIssued => BillingError::InvoiceAlreadyIssued {
                charge_id: err
                    .details
                    .get("charge_id")
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string()),
            },
            ErrorCode::ValidationFailed | ErrorCode::EmptyField | ErrorCode::InvalidFormat => {
                let field = err
                    .details
                    .get("field")
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string());
                BillingError::Validation(ValidationError::invalid_format(field, err.message))
            }
            _ => BillingError::Infrastructure(err.to_string()),
        }
    }
}

impl From<BillingError> for DomainError {
    fn from(err: BillingError) -> Self {
        DomainError::new(err.code(), err.to_string())
    }
}
