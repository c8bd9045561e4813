//! Value objects shared by the billing aggregates.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// How the gateway collects a charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillingType {
    Boleto,
    CreditCard,
    Pix,
    /// Payer chooses at checkout.
    Undefined,
}

impl BillingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingType::Boleto => "BOLETO",
            BillingType::CreditCard => "CREDIT_CARD",
            BillingType::Pix => "PIX",
            BillingType::Undefined => "UNDEFINED",
        }
    }
}

impl fmt::Display for BillingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BillingType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BOLETO" => Ok(BillingType::Boleto),
            "CREDIT_CARD" => Ok(BillingType::CreditCard),
            "PIX" => Ok(BillingType::Pix),
            "UNDEFINED" => Ok(BillingType::Undefined),
            other => Err(ValidationError::invalid_format(
                "billing_type",
                format!("unknown billing type '{}'", other),
            )),
        }
    }
}

/// Recurrence of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Cycle {
    Weekly,
    Monthly,
    Yearly,
}

impl Cycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cycle::Weekly => "WEEKLY",
            Cycle::Monthly => "MONTHLY",
            Cycle::Yearly => "YEARLY",
        }
    }
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Cycle {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "WEEKLY" => Ok(Cycle::Weekly),
            "MONTHLY" => Ok(Cycle::Monthly),
            "YEARLY" => Ok(Cycle::Yearly),
            other => Err(ValidationError::invalid_format(
                "cycle",
                format!("unknown cycle '{}'", other),
            )),
        }
    }
}

/// Status string mirrored verbatim from the gateway.
///
/// The gateway owns the vocabulary; the value is stored as received. The
/// only reading taken from it is [`GatewayStatus::is_collectable`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GatewayStatus(String);

impl GatewayStatus {
    pub fn new(status: impl Into<String>) -> Self {
        Self(status.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Charge statuses meaning the money arrived or is guaranteed.
    pub fn is_collectable(&self) -> bool {
        matches!(
            self.0.as_str(),
            "CONFIRMED" | "RECEIVED" | "RECEIVED_IN_CASH" | "DUNNING_RECEIVED"
        )
    }
}

impl fmt::Display for GatewayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Rejects zero and negative amounts.
pub fn require_positive(field: &str, value: Decimal) -> Result<(), ValidationError> {
    if value <= Decimal::ZERO {
        return Err(ValidationError::not_positive(field, value));
    }
    Ok(())
}

/// Rejects blank required text.
pub fn require_text(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::empty_field(field));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn billing_type_uses_gateway_spelling() {
        assert_eq!(
            serde_json::to_string(&BillingType::CreditCard).unwrap(),
            "\"CREDIT_CARD\""
        );
        assert_eq!("BOLETO".parse::<BillingType>().unwrap(), BillingType::Boleto);
        assert!("boleto".parse::<BillingType>().is_err());
    }

    #[test]
    fn cycle_accepts_only_three_recurrences() {
        assert_eq!("YEARLY".parse::<Cycle>().unwrap(), Cycle::Yearly);
        assert!("BIWEEKLY".parse::<Cycle>().is_err());
    }

    #[test]
    fn gateway_status_is_kept_verbatim() {
        let status = GatewayStatus::new("RECEIVED_IN_CASH");
        assert_eq!(status.as_str(), "RECEIVED_IN_CASH");
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"RECEIVED_IN_CASH\"");
    }

    #[test]
    fn settled_statuses_are_collectable() {
        for status in ["CONFIRMED", "RECEIVED", "RECEIVED_IN_CASH", "DUNNING_RECEIVED"] {
            assert!(GatewayStatus::new(status).is_collectable(), "{}", status);
        }
        for status in ["PENDING", "OVERDUE", "REFUNDED", "received"] {
            assert!(!GatewayStatus::new(status).is_collectable(), "{}", status);
        }
    }

    #[test]
    fn require_positive_rejects_zero() {
        assert!(require_positive("value", Decimal::ZERO).is_err());
        assert!(require_positive("value", Decimal::new(15000, 2)).is_ok());
    }
}
