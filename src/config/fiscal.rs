//! Fiscal defaults applied to automatically issued invoices

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::billing::{InvoiceDefaults, InvoiceTaxes};

use super::error::ValidationError;

/// Optional overrides of the built-in invoice defaults.
///
/// Unset fields fall back to [`InvoiceDefaults::default`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FiscalConfig {
    pub observations: Option<String>,
    pub municipal_service_code: Option<String>,
    pub municipal_service_name: Option<String>,
    /// Service tax (ISS) percentage
    pub iss_rate: Option<Decimal>,
}

impl FiscalConfig {
    pub fn defaults(&self) -> InvoiceDefaults {
        let base = InvoiceDefaults::default();
        InvoiceDefaults {
            observations: self.observations.clone().unwrap_or(base.observations),
            municipal_service_code: self
                .municipal_service_code
                .clone()
                .unwrap_or(base.municipal_service_code),
            municipal_service_name: self
                .municipal_service_name
                .clone()
                .unwrap_or(base.municipal_service_name),
            taxes: self
                .iss_rate
                .map(InvoiceTaxes::service_tax_only)
                .unwrap_or(base.taxes),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(rate) = self.iss_rate {
            if rate < Decimal::ZERO || rate > Decimal::ONE_HUNDRED {
                return Err(ValidationError::InvalidTaxRate);
            }
        }
        Ok(())
    }
}
