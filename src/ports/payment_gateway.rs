//! Payment gateway port.
//!
//! The gateway owns authoritative billing state. Every object created through
//! this port carries the local identifier as its external reference, which is
//! how gateway objects and webhook notices are mapped back to local records.
//!
//! # Design
//!
//! - **Lookups return `Option`**: absence on the gateway is a normal answer
//! - **No retries**: implementations report failures once; callers decide
//! - **Transport agnostic**: no HTTP types leak through this interface

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::domain::billing::{
    ChargeTerms, CustomerProfile, GatewayStatus, InvoiceDetails, SubscriptionPlan,
};
use crate::domain::foundation::GatewayId;

pub use crate::domain::billing::{GatewayError, GatewayErrorCode};

/// Port for the remote payment gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a customer.
    async fn create_customer(&self, request: &NewCustomer)
        -> Result<GatewayCustomer, GatewayError>;

    /// Find the customer whose external reference is `reference`.
    async fn find_customer_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<GatewayCustomer>, GatewayError>;

    /// Create a charge for an existing gateway customer.
    async fn create_charge(&self, request: &NewCharge) -> Result<GatewayCharge, GatewayError>;

    /// Find the charge whose external reference is `reference`.
    async fn find_charge_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<GatewayCharge>, GatewayError>;

    /// Replace the external reference of a charge.
    ///
    /// Used to push a local id onto charges the gateway generated itself.
    async fn update_charge_reference(
        &self,
        charge: &GatewayId,
        reference: &str,
    ) -> Result<(), GatewayError>;

    /// Create a recurring subscription.
    async fn create_subscription(
        &self,
        request: &NewSubscription,
    ) -> Result<GatewaySubscription, GatewayError>;

    /// Find the subscription whose external reference is `reference`.
    async fn find_subscription_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<GatewaySubscription>, GatewayError>;

    /// Get a subscription by gateway id.
    async fn get_subscription(
        &self,
        id: &GatewayId,
    ) -> Result<Option<GatewaySubscription>, GatewayError>;

    /// Cancel a subscription, returning it in its terminal status.
    async fn cancel_subscription(&self, id: &GatewayId)
        -> Result<GatewaySubscription, GatewayError>;

    /// Issue a fiscal invoice for a charge.
    async fn create_invoice(&self, request: &NewInvoice) -> Result<GatewayInvoice, GatewayError>;

    /// Find the invoice whose external reference is `reference`.
    async fn find_invoice_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<GatewayInvoice>, GatewayError>;
}

// ════════════════════════════════════════════════════════════════════════════════
// Requests
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCustomer {
    pub external_reference: String,
    pub profile: CustomerProfile,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCharge {
    /// Gateway id of the paying customer.
    pub customer: GatewayId,
    pub external_reference: String,
    pub terms: ChargeTerms,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubscription {
    pub customer: GatewayId,
    pub external_reference: String,
    pub plan: SubscriptionPlan,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInvoice {
    /// Gateway id of the invoiced charge.
    pub charge: GatewayId,
    pub external_reference: String,
    pub details: InvoiceDetails,
}

// ════════════════════════════════════════════════════════════════════════════════
// Gateway records
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayCustomer {
    pub id: GatewayId,
    pub external_reference: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayCharge {
    pub id: GatewayId,
    pub customer: Option<String>,
    pub subscription: Option<String>,
    pub status: GatewayStatus,
    pub value: Option<Decimal>,
    pub due_date: Option<NaiveDate>,
    pub external_reference: Option<String>,
    pub invoice_url: Option<String>,
    pub receipt_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewaySubscription {
    pub id: GatewayId,
    pub customer: Option<String>,
    pub status: GatewayStatus,
    pub external_reference: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayInvoice {
    pub id: GatewayId,
    pub status: GatewayStatus,
    pub external_reference: Option<String>,
    pub payment_link: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_gateway_is_object_safe() {
        fn _accepts_dyn(_gateway: &dyn PaymentGateway) {}
    }
}
