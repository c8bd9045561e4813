//! HTTP DTOs for the billing endpoints.
//!
//! Requests arrive as snake_case JSON and are converted into domain values
//! before any handler runs; responses flatten the local/gateway correlation
//! into `id` and `remote_id`.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::billing::{
    BillingType, Charge, ChargeCallback, ChargeTerms, Customer, CustomerProfile, Cycle, Invoice,
    InvoiceDetails, Subscription, SubscriptionPlan,
};
use crate::domain::foundation::Timestamp;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to register a customer.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCustomerRequest {
    pub name: String,
    /// CPF or CNPJ.
    pub cpf_cnpj: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub mobile_phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub address_number: Option<String>,
    #[serde(default)]
    pub complement: Option<String>,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub notification_disabled: bool,
    #[serde(default)]
    pub additional_emails: Option<String>,
}

impl From<CreateCustomerRequest> for CustomerProfile {
    fn from(req: CreateCustomerRequest) -> Self {
        CustomerProfile {
            name: req.name,
            email: req.email,
            cpf_cnpj: req.cpf_cnpj,
            phone: req.phone,
            mobile_phone: req.mobile_phone,
            address: req.address,
            address_number: req.address_number,
            complement: req.complement,
            province: req.province,
            postal_code: req.postal_code,
            notification_disabled: req.notification_disabled,
            additional_emails: req.additional_emails,
        }
    }
}

/// Request to create a one-off charge for an existing customer.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateChargeRequest {
    pub customer_id: String,
    pub billing_type: BillingType,
    pub value: Decimal,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub installment_count: Option<u32>,
    #[serde(default)]
    pub callback: Option<ChargeCallback>,
}

impl CreateChargeRequest {
    pub fn terms(&self) -> ChargeTerms {
        ChargeTerms {
            billing_type: self.billing_type,
            value: self.value,
            due_date: self.due_date,
            description: self.description.clone(),
            installment_count: self.installment_count,
            callback: self.callback.clone(),
        }
    }
}

/// Request to create a recurring subscription for an existing customer.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSubscriptionRequest {
    pub customer_id: String,
    pub billing_type: BillingType,
    pub value: Decimal,
    pub cycle: Cycle,
    pub next_due_date: NaiveDate,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub max_payments: Option<u32>,
}

impl CreateSubscriptionRequest {
    pub fn plan(&self) -> SubscriptionPlan {
        SubscriptionPlan {
            billing_type: self.billing_type,
            value: self.value,
            cycle: self.cycle,
            next_due_date: self.next_due_date,
            description: self.description.clone(),
            end_date: self.end_date,
            max_payments: self.max_payments,
        }
    }
}

/// Request to issue a service invoice for a charge.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateInvoiceRequest {
    pub charge_id: String,
    /// Defaults to the charge id when absent or blank.
    #[serde(default)]
    pub external_reference: Option<String>,
    pub details: InvoiceDetails,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
pub struct CustomerResponse {
    pub id: String,
    pub remote_id: Option<String>,
    pub name: String,
    pub cpf_cnpj: String,
    pub email: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<Customer> for CustomerResponse {
    fn from(customer: Customer) -> Self {
        Self {
            id: customer.id().to_string(),
            remote_id: customer.remote_id().map(|r| r.to_string()),
            name: customer.profile.name,
            cpf_cnpj: customer.profile.cpf_cnpj,
            email: customer.profile.email,
            created_at: customer.created_at,
            updated_at: customer.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChargeResponse {
    pub id: String,
    pub remote_id: Option<String>,
    pub customer_id: String,
    pub subscription_id: Option<String>,
    pub billing_type: BillingType,
    pub value: Decimal,
    pub due_date: NaiveDate,
    pub description: Option<String>,
    pub status: String,
    pub invoice_url: Option<String>,
    pub receipt_url: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<Charge> for ChargeResponse {
    fn from(charge: Charge) -> Self {
        Self {
            id: charge.id().to_string(),
            remote_id: charge.remote_id().map(|r| r.to_string()),
            customer_id: charge.customer_id.to_string(),
            subscription_id: charge.subscription_id.as_ref().map(|s| s.to_string()),
            billing_type: charge.terms.billing_type,
            value: charge.terms.value,
            due_date: charge.terms.due_date,
            description: charge.terms.description,
            status: charge.status.to_string(),
            invoice_url: charge.invoice_url,
            receipt_url: charge.receipt_url,
            created_at: charge.created_at,
            updated_at: charge.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionResponse {
    pub id: String,
    pub remote_id: Option<String>,
    pub customer_id: String,
    pub billing_type: BillingType,
    pub value: Decimal,
    pub cycle: Cycle,
    pub next_due_date: NaiveDate,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<Subscription> for SubscriptionResponse {
    fn from(subscription: Subscription) -> Self {
        Self {
            id: subscription.id().to_string(),
            remote_id: subscription.remote_id().map(|r| r.to_string()),
            customer_id: subscription.customer_id.to_string(),
            billing_type: subscription.plan.billing_type,
            value: subscription.plan.value,
            cycle: subscription.plan.cycle,
            next_due_date: subscription.plan.next_due_date,
            status: subscription.status.to_string(),
            created_at: subscription.created_at,
            updated_at: subscription.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InvoiceResponse {
    pub id: String,
    pub remote_id: Option<String>,
    pub charge_id: String,
    pub external_reference: String,
    pub value: Decimal,
    pub effective_date: NaiveDate,
    pub status: String,
    pub payment_link: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<Invoice> for InvoiceResponse {
    fn from(invoice: Invoice) -> Self {
        Self {
            id: invoice.id().to_string(),
            remote_id: invoice.remote_id().map(|r| r.to_string()),
            charge_id: invoice.charge_id.to_string(),
            external_reference: invoice.external_reference,
            value: invoice.details.value,
            effective_date: invoice.details.effective_date,
            status: invoice.status.to_string(),
            payment_link: invoice.payment_link,
            created_at: invoice.created_at,
            updated_at: invoice.updated_at,
        }
    }
}

/// Body returned to the gateway after a delivery was processed.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookAck {
    pub outcome: &'static str,
}

/// Standard error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn customer_request_defaults_optional_fields() {
        let req: CreateCustomerRequest = serde_json::from_value(json!({
            "name": "Maria Souza",
            "cpf_cnpj": "24971563792"
        }))
        .unwrap();

        let profile = CustomerProfile::from(req);
        assert_eq!(profile.name, "Maria Souza");
        assert!(profile.email.is_none());
        assert!(!profile.notification_disabled);
    }

    #[test]
    fn charge_request_parses_gateway_enums() {
        let req: CreateChargeRequest = serde_json::from_value(json!({
            "customer_id": "cust-1",
            "billing_type": "CREDIT_CARD",
            "value": 150.0,
            "due_date": "2025-01-10"
        }))
        .unwrap();

        let terms = req.terms();
        assert_eq!(terms.billing_type, BillingType::CreditCard);
        assert_eq!(terms.value, Decimal::new(150, 0));
        assert!(terms.callback.is_none());
    }

    #[test]
    fn subscription_request_rejects_unknown_cycle() {
        let result: Result<CreateSubscriptionRequest, _> = serde_json::from_value(json!({
            "customer_id": "cust-1",
            "billing_type": "PIX",
            "value": 49.9,
            "cycle": "FORTNIGHTLY",
            "next_due_date": "2025-02-01"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn error_response_serializes_code_and_message() {
        let body = serde_json::to_value(ErrorResponse::new("CHARGE_NOT_FOUND", "missing")).unwrap();
        assert_eq!(body, json!({"code": "CHARGE_NOT_FOUND", "message": "missing"}));
    }
}
