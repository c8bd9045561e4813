//! Strongly-typed identifier value objects.
//!
//! Two identifier spaces coexist: local identifiers minted by this system and
//! gateway identifiers assigned by the payment gateway. They are never mixed;
//! [`Correlation`] pairs them explicitly.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::{DomainError, ErrorCode, ValidationError};

/// Declares an opaque, string-backed local identifier.
///
/// Local identifiers travel to the gateway as the external reference, so they
/// are plain strings rather than UUIDs: records materialized from earlier
/// deployments may carry any non-empty value.
macro_rules! local_id {
    ($(#[$meta:meta])* $name:ident, $field:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Mints a fresh identifier.
            pub fn generate() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            /// Wraps an existing identifier, rejecting empty strings.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.trim().is_empty() {
                    return Err(ValidationError::empty_field($field));
                }
                Ok(Self(id))
            }

            /// Returns the inner string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

local_id!(
    /// Local identifier of a customer.
    CustomerId,
    "customer_id"
);

local_id!(
    /// Local identifier of a charge (a single billing instance).
    ChargeId,
    "charge_id"
);

local_id!(
    /// Local identifier of a recurring subscription.
    SubscriptionId,
    "subscription_id"
);

local_id!(
    /// Local identifier of a fiscal invoice.
    InvoiceId,
    "invoice_id"
);

/// Identifier assigned by the payment gateway.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GatewayId(String);

impl GatewayId {
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ValidationError::empty_field("gateway_id"));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GatewayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for GatewayId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<GatewayId> for String {
    fn from(id: GatewayId) -> Self {
        id.0
    }
}

/// Pairing of a local identifier with the gateway identifier of the same object.
///
/// The remote half is empty until the first successful create on the gateway
/// and never changes once bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correlation<L> {
    local: L,
    remote: Option<GatewayId>,
}

impl<L: fmt::Display> Correlation<L> {
    /// Correlation for a record not yet known to the gateway.
    pub fn local(local: L) -> Self {
        Self { local, remote: None }
    }

    /// Correlation for a record already bound to a gateway object.
    pub fn bound(local: L, remote: GatewayId) -> Self {
        Self {
            local,
            remote: Some(remote),
        }
    }

    pub fn local_id(&self) -> &L {
        &self.local
    }

    pub fn remote_id(&self) -> Option<&GatewayId> {
        self.remote.as_ref()
    }

    pub fn is_bound(&self) -> bool {
        self.remote.is_some()
    }

    /// The value embedded as external reference in outbound gateway payloads.
    pub fn external_reference(&self) -> String {
        self.local.to_string()
    }

    /// Binds the gateway identifier. Rebinding to the same id is accepted.
    pub fn bind_remote(&mut self, remote: GatewayId) -> Result<(), DomainError> {
        match &self.remote {
            Some(existing) if existing != &remote => Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!(
                    "{} is already bound to gateway id {}, refusing {}",
                    self.local, existing, remote
                ),
            )),
            _ => {
                self.remote = Some(remote);
                Ok(())
            }
        }
    }
}
