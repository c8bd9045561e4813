//! Charge repository port.

use async_trait::async_trait;

use crate::domain::billing::{Charge, GatewayStatus};
use crate::domain::foundation::{ChargeId, DomainError, GatewayId};

/// Persistence for Charge records.
///
/// The external reference of a charge is always its local id, so
/// `find_by_external_reference` resolves the correlation field of a
/// gateway notice against the id column.
#[async_trait]
pub trait ChargeRepository: Send + Sync {
    /// Save a new charge.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if the id or gateway id is already taken
    /// - `DatabaseError` on persistence failure
    async fn save(&self, charge: &Charge) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: &ChargeId) -> Result<Option<Charge>, DomainError>;

    /// Find the charge a gateway notice refers to by its external reference.
    async fn find_by_external_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Charge>, DomainError>;

    /// Find the charge bound to a gateway id.
    async fn find_by_remote_id(&self, remote_id: &GatewayId)
        -> Result<Option<Charge>, DomainError>;

    /// Mirror a gateway status transition.
    ///
    /// URLs passed as `None` keep their stored value.
    ///
    /// # Errors
    ///
    /// - `ChargeNotFound` if no charge has this id
    async fn update_status(
        &self,
        id: &ChargeId,
        status: &GatewayStatus,
        invoice_url: Option<&str>,
        receipt_url: Option<&str>,
    ) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charge_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn ChargeRepository) {}
    }
}
