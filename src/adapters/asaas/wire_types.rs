//! Asaas v3 REST API request and response bodies.
//!
//! Monetary values travel as JSON numbers, dates as `YYYY-MM-DD`.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::billing::{BillingType, Cycle, GatewayStatus};
use crate::domain::foundation::GatewayId;
use crate::ports::{
    GatewayCharge, GatewayCustomer, GatewayError, GatewayInvoice, GatewaySubscription, NewCharge,
    NewCustomer, NewInvoice, NewSubscription,
};

// ════════════════════════════════════════════════════════════════════════════════
// Requests
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub cpf_cnpj: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complement: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    pub external_reference: String,
    pub notification_disabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_emails: Option<String>,
}

impl From<&NewCustomer> for CustomerRequest {
    fn from(request: &NewCustomer) -> Self {
        let p = request.profile.clone();
        Self {
            name: p.name,
            email: p.email,
            cpf_cnpj: p.cpf_cnpj,
            phone: p.phone,
            mobile_phone: p.mobile_phone,
            address: p.address,
            address_number: p.address_number,
            complement: p.complement,
            province: p.province,
            postal_code: p.postal_code,
            external_reference: request.external_reference.clone(),
            notification_disabled: p.notification_disabled,
            additional_emails: p.additional_emails,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackRequest {
    pub success_url: String,
    pub auto_redirect: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeRequest {
    pub customer: String,
    pub billing_type: BillingType,
    #[serde(with = "rust_decimal::serde::float")]
    pub value: Decimal,
    pub due_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installment_count: Option<u32>,
    pub external_reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback: Option<CallbackRequest>,
}

impl From<&NewCharge> for ChargeRequest {
    fn from(request: &NewCharge) -> Self {
        let t = &request.terms;
        Self {
            customer: request.customer.to_string(),
            billing_type: t.billing_type,
            value: t.value,
            due_date: t.due_date,
            description: t.description.clone(),
            installment_count: t.installment_count,
            external_reference: request.external_reference.clone(),
            callback: t.callback.as_ref().map(|c| CallbackRequest {
                success_url: c.success_url.clone(),
                auto_redirect: c.auto_redirect,
            }),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReferenceRequest {
    pub external_reference: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRequest {
    pub customer: String,
    pub billing_type: BillingType,
    #[serde(with = "rust_decimal::serde::float")]
    pub value: Decimal,
    pub next_due_date: NaiveDate,
    pub cycle: Cycle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_payments: Option<u32>,
    pub external_reference: String,
}

impl From<&NewSubscription> for SubscriptionRequest {
    fn from(request: &NewSubscription) -> Self {
        let p = &request.plan;
        Self {
            customer: request.customer.to_string(),
            billing_type: p.billing_type,
            value: p.value,
            next_due_date: p.next_due_date,
            cycle: p.cycle,
            description: p.description.clone(),
            end_date: p.end_date,
            max_payments: p.max_payments,
            external_reference: request.external_reference.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxesRequest {
    pub retain_iss: bool,
    #[serde(with = "rust_decimal::serde::float")]
    pub cofins: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub csll: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub inss: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub ir: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub pis: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub iss: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRequest {
    pub payment: String,
    pub service_description: String,
    pub observations: String,
    pub external_reference: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub value: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub deductions: Decimal,
    pub effective_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub municipal_service_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub municipal_service_code: Option<String>,
    pub municipal_service_name: String,
    pub update_payment: bool,
    pub taxes: TaxesRequest,
}

impl From<&NewInvoice> for InvoiceRequest {
    fn from(request: &NewInvoice) -> Self {
        let d = &request.details;
        Self {
            payment: request.charge.to_string(),
            service_description: d.service_description.clone(),
            observations: d.observations.clone(),
            external_reference: request.external_reference.clone(),
            value: d.value,
            deductions: d.deductions,
            effective_date: d.effective_date,
            municipal_service_id: d.municipal_service_id.clone(),
            municipal_service_code: d.municipal_service_code.clone(),
            municipal_service_name: d.municipal_service_name.clone(),
            update_payment: d.update_payment,
            taxes: TaxesRequest {
                retain_iss: d.taxes.retain_iss,
                cofins: d.taxes.cofins,
                csll: d.taxes.csll,
                inss: d.taxes.inss,
                ir: d.taxes.ir,
                pis: d.taxes.pis,
                iss: d.taxes.iss,
            },
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Responses
// ════════════════════════════════════════════════════════════════════════════════

/// Envelope of list endpoints.
#[derive(Debug, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerResponse {
    pub id: String,
    pub external_reference: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeResponse {
    pub id: String,
    pub customer: Option<String>,
    pub subscription: Option<String>,
    pub status: String,
    pub value: Option<Decimal>,
    pub due_date: Option<NaiveDate>,
    pub external_reference: Option<String>,
    pub invoice_url: Option<String>,
    pub transaction_receipt_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionResponse {
    pub id: String,
    pub customer: Option<String>,
    pub status: String,
    pub external_reference: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceResponse {
    pub id: String,
    pub status: String,
    pub external_reference: Option<String>,
    pub payment_link: Option<String>,
}

/// Body of `DELETE` endpoints.
#[derive(Debug, Deserialize)]
pub struct DeletedResponse {
    pub id: String,
    #[serde(default)]
    pub deleted: bool,
}

/// `{"errors":[{"code": ..., "description": ...}]}`
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub errors: Vec<ErrorItem>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorItem {
    pub code: Option<String>,
    pub description: Option<String>,
}

fn gateway_id(id: String) -> Result<GatewayId, GatewayError> {
    GatewayId::new(id).map_err(|e| GatewayError::invalid_response(e.to_string()))
}

impl TryFrom<CustomerResponse> for GatewayCustomer {
    type Error = GatewayError;

    fn try_from(r: CustomerResponse) -> Result<Self, Self::Error> {
        Ok(Self {
            id: gateway_id(r.id)?,
            external_reference: r.external_reference,
        })
    }
}

impl TryFrom<ChargeResponse> for GatewayCharge {
    type Error = GatewayError;

    fn try_from(r: ChargeResponse) -> Result<Self, Self::Error> {
        Ok(Self {
            id: gateway_id(r.id)?,
            customer: r.customer,
            subscription: r.subscription,
            status: GatewayStatus::new(r.status),
            value: r.value,
            due_date: r.due_date,
            external_reference: r.external_reference,
            invoice_url: r.invoice_url,
            receipt_url: r.transaction_receipt_url,
        })
    }
}

impl TryFrom<SubscriptionResponse> for GatewaySubscription {
    type Error = GatewayError;

    fn try_from(r: SubscriptionResponse) -> Result<Self, Self::Error> {
        Ok(Self {
            id: gateway_id(r.id)?,
            customer: r.customer,
            status: GatewayStatus::new(r.status),
            external_reference: r.external_reference,
        })
    }
}

impl TryFrom<InvoiceResponse> for GatewayInvoice {
    type Error = GatewayError;

    fn try_from(r: InvoiceResponse) -> Result<Self, Self::Error> {
        Ok(Self {
            id: gateway_id(r.id)?,
            status: GatewayStatus::new(r.status),
            external_reference: r.external_reference,
            payment_link: r.payment_link,
        })
    }
}
