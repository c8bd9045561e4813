//! Charge aggregate - a single billing instance.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    ChargeId, Correlation, CustomerId, GatewayId, SubscriptionId, Timestamp, ValidationError,
};

use super::values::{require_positive, require_text, BillingType, GatewayStatus};

/// Where the gateway checkout sends the payer after a successful payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeCallback {
    pub success_url: String,
    pub auto_redirect: bool,
}

/// What is being charged, as requested by the caller or reported by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeTerms {
    pub billing_type: BillingType,
    pub value: Decimal,
    pub due_date: NaiveDate,
    pub description: Option<String>,
    pub installment_count: Option<u32>,
    pub callback: Option<ChargeCallback>,
}

impl ChargeTerms {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_positive("value", self.value)?;
        if self.installment_count == Some(0) {
            return Err(ValidationError::not_positive("installment_count", 0));
        }
        if let Some(callback) = &self.callback {
            require_text("callback.success_url", &callback.success_url)?;
        }
        Ok(())
    }
}

/// Gateway-owned fields captured from a create response or a notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteChargeState {
    pub remote_id: GatewayId,
    pub status: GatewayStatus,
    pub invoice_url: Option<String>,
    pub receipt_url: Option<String>,
}

/// A charge mirrored between the local store and the gateway.
///
/// # Invariants
///
/// - belongs to exactly one customer
/// - `subscription_id` is set only for charges the gateway generated from a
///   subscription billing cycle, and then references a local subscription
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Charge {
    pub correlation: Correlation<ChargeId>,
    pub customer_id: CustomerId,
    pub subscription_id: Option<SubscriptionId>,
    pub terms: ChargeTerms,
    pub status: GatewayStatus,
    pub invoice_url: Option<String>,
    pub receipt_url: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Charge {
    /// Record for a charge this system asked the gateway to create.
    pub fn register(
        id: ChargeId,
        customer_id: CustomerId,
        terms: ChargeTerms,
        remote: RemoteChargeState,
    ) -> Self {
        Self::build(id, customer_id, None, terms, remote)
    }

    /// Record for a charge the gateway generated on its own for a subscription.
    pub fn materialize(
        id: ChargeId,
        customer_id: CustomerId,
        subscription_id: SubscriptionId,
        terms: ChargeTerms,
        remote: RemoteChargeState,
    ) -> Self {
        Self::build(id, customer_id, Some(subscription_id), terms, remote)
    }

    fn build(
        id: ChargeId,
        customer_id: CustomerId,
        subscription_id: Option<SubscriptionId>,
        terms: ChargeTerms,
        remote: RemoteChargeState,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            correlation: Correlation::bound(id, remote.remote_id),
            customer_id,
            subscription_id,
            terms,
            status: remote.status,
            invoice_url: remote.invoice_url,
            receipt_url: remote.receipt_url,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> &ChargeId {
        self.correlation.local_id()
    }

    pub fn remote_id(&self) -> Option<&GatewayId> {
        self.correlation.remote_id()
    }

    /// Applies a gateway status transition.
    ///
    /// URLs absent from the notice keep their current value.
    pub fn apply_status(
        &mut self,
        status: GatewayStatus,
        invoice_url: Option<String>,
        receipt_url: Option<String>,
    ) {
        self.status = status;
        if invoice_url.is_some() {
            self.invoice_url = invoice_url;
        }
        if receipt_url.is_some() {
            self.receipt_url = receipt_url;
        }
        self.updated_at = Timestamp::now();
    }

    /// Description used on the fiscal invoice.
    pub fn service_description(&self) -> String {
        match self.terms.description.as_deref().map(str::trim) {
            Some(d) if !d.is_empty() => d.to_string(),
            _ => format!("Charge {}", self.id()),
        }
    }
}
