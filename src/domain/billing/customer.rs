//! Customer aggregate.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Correlation, CustomerId, GatewayId, Timestamp, ValidationError};

use super::values::require_text;

/// Contact and address data sent to the gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub name: String,
    pub email: Option<String>,
    /// CPF or CNPJ tax number.
    pub cpf_cnpj: String,
    pub phone: Option<String>,
    pub mobile_phone: Option<String>,
    pub address: Option<String>,
    pub address_number: Option<String>,
    pub complement: Option<String>,
    pub province: Option<String>,
    pub postal_code: Option<String>,
    /// Suppresses gateway e-mail/SMS notifications to this customer.
    pub notification_disabled: bool,
    pub additional_emails: Option<String>,
}

impl CustomerProfile {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)?;
        require_text("cpf_cnpj", &self.cpf_cnpj)?;
        if !self.cpf_cnpj.chars().all(|c| c.is_ascii_digit() || ".-/".contains(c)) {
            return Err(ValidationError::invalid_format(
                "cpf_cnpj",
                "only digits and . - / separators are allowed",
            ));
        }
        if let Some(email) = &self.email {
            if !email.contains('@') {
                return Err(ValidationError::invalid_format("email", "missing @ symbol"));
            }
        }
        Ok(())
    }
}

/// A payer known both locally and to the gateway.
///
/// Customers have no gateway-driven status; webhooks never touch them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub correlation: Correlation<CustomerId>,
    pub profile: CustomerProfile,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Customer {
    /// Builds the record persisted after the gateway accepted the customer.
    pub fn register(id: CustomerId, remote: GatewayId, profile: CustomerProfile) -> Self {
        let now = Timestamp::now();
        Self {
            correlation: Correlation::bound(id, remote),
            profile,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> &CustomerId {
        self.correlation.local_id()
    }

    pub fn remote_id(&self) -> Option<&GatewayId> {
        self.correlation.remote_id()
    }
}
