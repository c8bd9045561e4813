//! Failures reported by the payment gateway capability.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, ErrorCode};

/// Gateway error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayErrorCode {
    /// Connection refused, reset, DNS failure.
    Network,

    /// No response within the configured timeout.
    Timeout,

    /// API key missing or rejected.
    Authentication,

    /// Gateway refused the request (4xx with error body).
    Rejected,

    /// Addressed object does not exist on the gateway.
    NotFound,

    RateLimited,

    /// Gateway-side failure (5xx).
    Provider,

    /// Response could not be decoded.
    InvalidResponse,
}

impl GatewayErrorCode {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GatewayErrorCode::Network
                | GatewayErrorCode::Timeout
                | GatewayErrorCode::RateLimited
                | GatewayErrorCode::Provider
        )
    }
}

impl std::fmt::Display for GatewayErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GatewayErrorCode::Network => "network_error",
            GatewayErrorCode::Timeout => "timeout",
            GatewayErrorCode::Authentication => "authentication_error",
            GatewayErrorCode::Rejected => "rejected",
            GatewayErrorCode::NotFound => "not_found",
            GatewayErrorCode::RateLimited => "rate_limited",
            GatewayErrorCode::Provider => "provider_error",
            GatewayErrorCode::InvalidResponse => "invalid_response",
        };
        write!(f, "{}", s)
    }
}

/// Error returned by a [`PaymentGateway`](crate::ports::PaymentGateway) call.
///
/// Propagated to callers unchanged; no retry happens in this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayError {
    pub code: GatewayErrorCode,

    pub message: String,

    /// Gateway's own error code, e.g. `invalid_value`.
    pub provider_code: Option<String>,

    /// HTTP status of the failed response, when there was one.
    pub http_status: Option<u16>,
}

impl GatewayError {
    pub fn new(code: GatewayErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider_code: None,
            http_status: None,
        }
    }

    pub fn with_provider_code(mut self, code: impl Into<String>) -> Self {
        self.provider_code = Some(code.into());
        self
    }

    pub fn with_http_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::Network, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::Timeout, message)
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::Authentication, message)
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::Rejected, message)
    }

    pub fn not_found(resource: &str) -> Self {
        Self::new(GatewayErrorCode::NotFound, format!("{} not found", resource))
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::Provider, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::InvalidResponse, message)
    }

    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.provider_code {
            Some(pc) => write!(f, "{} ({}): {}", self.code, pc, self.message),
            None => write!(f, "{}: {}", self.code, self.message),
        }
    }
}

impl std::error::Error for GatewayError {}

impl From<GatewayError> for DomainError {
    fn from(err: GatewayError) -> Self {
        let code = match err.code {
            GatewayErrorCode::NotFound => ErrorCode::RemoteNotFound,
            _ => ErrorCode::GatewayError,
        };
        let mut domain =
            DomainError::new(code, err.message).with_detail("gateway_code", err.code.to_string());
        if let Some(pc) = err.provider_code {
            domain = domain.with_detail("provider_code", pc);
        }
        domain
    }
}
