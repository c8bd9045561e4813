//! Invoice repository port.

use async_trait::async_trait;

use crate::domain::billing::{GatewayStatus, Invoice};
use crate::domain::foundation::{ChargeId, DomainError, InvoiceId};

/// Persistence for Invoice records.
///
/// Implementations must hold at most one invoice per charge.
#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    /// Save a new invoice.
    ///
    /// # Errors
    ///
    /// - `InvoiceAlreadyIssued` (with a `charge_id` detail) if the charge
    ///   already has an invoice, including when a concurrent writer won
    /// - `ValidationFailed` if another invoice holds the external reference
    /// - `DatabaseError` on persistence failure
    async fn save(&self, invoice: &Invoice) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: &InvoiceId) -> Result<Option<Invoice>, DomainError>;

    /// The invoice issued for `charge_id`, if any.
    async fn find_by_charge_id(&self, charge_id: &ChargeId) -> Result<Option<Invoice>, DomainError>;

    async fn find_by_external_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Invoice>, DomainError>;

    /// # Errors
    ///
    /// - `InvoiceNotFound` if no invoice has this id
    async fn update_status(&self, id: &InvoiceId, status: &GatewayStatus)
        -> Result<(), DomainError>;
}
