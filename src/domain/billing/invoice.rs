//! Invoice aggregate - the fiscal document issued for a settled charge.
//!
//! At most one invoice exists per charge. The storage layer enforces this with
//! a unique key on the charge id; the issuer checks it before every attempt.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    ChargeId, Correlation, GatewayId, InvoiceId, Timestamp, ValidationError,
};

use super::charge::Charge;
use super::values::{require_positive, require_text, GatewayStatus};

/// Standard notice printed on invoices issued under the Simples Nacional regime.
pub const SIMPLIFIED_REGIME_NOTICE: &str = "Documento emitido por ME ou EPP optante pelo \
     Simples Nacional. Não gera direito a crédito fiscal de IPI.";

/// Municipal service list item 01.03 (data processing and hosting).
pub const DEFAULT_MUNICIPAL_SERVICE_CODE: &str = "01.03.01";

pub const DEFAULT_MUNICIPAL_SERVICE_NAME: &str = "Processamento, armazenamento ou hospedagem \
     de dados, textos, imagens, vídeos, páginas eletrônicas, aplicativos e sistemas de \
     informação, entre outros formatos, e congêneres.";

/// Tax breakdown, in percent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceTaxes {
    pub retain_iss: bool,
    pub cofins: Decimal,
    pub csll: Decimal,
    pub inss: Decimal,
    pub ir: Decimal,
    pub pis: Decimal,
    pub iss: Decimal,
}

impl InvoiceTaxes {
    /// Withholdings zeroed, service tax at `iss` percent.
    pub fn service_tax_only(iss: Decimal) -> Self {
        Self {
            retain_iss: false,
            cofins: Decimal::ZERO,
            csll: Decimal::ZERO,
            inss: Decimal::ZERO,
            ir: Decimal::ZERO,
            pis: Decimal::ZERO,
            iss,
        }
    }
}

/// Fiscal content of an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceDetails {
    pub service_description: String,
    pub observations: String,
    pub value: Decimal,
    pub deductions: Decimal,
    pub effective_date: NaiveDate,
    pub municipal_service_id: Option<String>,
    pub municipal_service_code: Option<String>,
    pub municipal_service_name: String,
    /// Lets the gateway adjust the charge value to the invoice value.
    pub update_payment: bool,
    pub taxes: InvoiceTaxes,
}

impl InvoiceDetails {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("service_description", &self.service_description)?;
        require_text("municipal_service_name", &self.municipal_service_name)?;
        require_positive("value", self.value)?;
        if self.deductions < Decimal::ZERO || self.deductions > self.value {
            return Err(ValidationError::invalid_format(
                "deductions",
                "must be between zero and the invoice value",
            ));
        }
        if self.municipal_service_id.is_none() && self.municipal_service_code.is_none() {
            return Err(ValidationError::empty_field("municipal_service_code"));
        }
        Ok(())
    }
}

/// Fixed fiscal values used when an invoice is issued automatically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceDefaults {
    pub observations: String,
    pub municipal_service_code: String,
    pub municipal_service_name: String,
    pub taxes: InvoiceTaxes,
}

impl Default for InvoiceDefaults {
    fn default() -> Self {
        Self {
            observations: SIMPLIFIED_REGIME_NOTICE.to_string(),
            municipal_service_code: DEFAULT_MUNICIPAL_SERVICE_CODE.to_string(),
            municipal_service_name: DEFAULT_MUNICIPAL_SERVICE_NAME.to_string(),
            taxes: InvoiceTaxes::service_tax_only(Decimal::new(5, 0)),
        }
    }
}

impl InvoiceDefaults {
    /// Invoice content for `charge`, effective on `today`.
    pub fn details_for(&self, charge: &Charge, today: NaiveDate) -> InvoiceDetails {
        InvoiceDetails {
            service_description: charge.service_description(),
            observations: self.observations.clone(),
            value: charge.terms.value,
            deductions: Decimal::ZERO,
            effective_date: today,
            municipal_service_id: None,
            municipal_service_code: Some(self.municipal_service_code.clone()),
            municipal_service_name: self.municipal_service_name.clone(),
            update_payment: false,
            taxes: self.taxes.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub correlation: Correlation<InvoiceId>,
    pub charge_id: ChargeId,
    /// Correlation field sent to the gateway; the charge id unless the caller chose one.
    pub external_reference: String,
    pub details: InvoiceDetails,
    pub status: GatewayStatus,
    pub payment_link: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Invoice {
    pub fn register(
        id: InvoiceId,
        charge_id: ChargeId,
        external_reference: String,
        details: InvoiceDetails,
        remote_id: GatewayId,
        status: GatewayStatus,
        payment_link: Option<String>,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            correlation: Correlation::bound(id, remote_id),
            charge_id,
            external_reference,
            details,
            status,
            payment_link,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> &InvoiceId {
        self.correlation.local_id()
    }

    pub fn remote_id(&self) -> Option<&GatewayId> {
        self.correlation.remote_id()
    }

    pub fn apply_status(&mut self, status: GatewayStatus) {
        self.status = status;
        self.updated_at = Timestamp::now();
    }
}
