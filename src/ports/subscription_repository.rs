//! Subscription repository port.

use async_trait::async_trait;

use crate::domain::billing::{GatewayStatus, Subscription};
use crate::domain::foundation::{DomainError, SubscriptionId};

/// Persistence for Subscription records.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    async fn save(&self, subscription: &Subscription) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: &SubscriptionId) -> Result<Option<Subscription>, DomainError>;

    /// Find the subscription a gateway object refers to by its external reference.
    async fn find_by_external_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Subscription>, DomainError>;

    /// # Errors
    ///
    /// - `SubscriptionNotFound` if no subscription has this id
    async fn update_status(
        &self,
        id: &SubscriptionId,
        status: &GatewayStatus,
    ) -> Result<(), DomainError>;
}
