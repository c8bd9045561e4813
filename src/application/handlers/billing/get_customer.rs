//! GetCustomerHandler - Query handler for a single customer.

use std::sync::Arc;

use crate::domain::billing::{BillingError, Customer};
use crate::domain::foundation::CustomerId;
use crate::ports::CustomerRepository;

#[derive(Debug, Clone)]
pub struct GetCustomerQuery {
    pub customer_id: CustomerId,
}

/// Reads a customer from the local store.
pub struct GetCustomerHandler {
    customers: Arc<dyn CustomerRepository>,
}

impl GetCustomerHandler {
    pub fn new(customers: Arc<dyn CustomerRepository>) -> Self {
        Self { customers }
    }

    pub async fn handle(&self, query: GetCustomerQuery) -> Result<Customer, BillingError> {
        self.customers
            .find_by_id(&query.customer_id)
            .await?
            .ok_or_else(|| BillingError::not_found("customer", &query.customer_id))
    }
}
