//! Customer repository port.

use async_trait::async_trait;

use crate::domain::billing::Customer;
use crate::domain::foundation::{CustomerId, DomainError};

/// Persistence for Customer records.
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// Save a new customer.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if the id is already taken
    /// - `DatabaseError` on persistence failure
    async fn save(&self, customer: &Customer) -> Result<(), DomainError>;

    /// Find a customer by local id.
    async fn find_by_id(&self, id: &CustomerId) -> Result<Option<Customer>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn customer_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn CustomerRepository) {}
    }
}
