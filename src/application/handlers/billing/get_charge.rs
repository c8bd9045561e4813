//! GetChargeHandler - Query handler for a single charge.

use std::sync::Arc;

use crate::domain::billing::{BillingError, Charge};
use crate::domain::foundation::ChargeId;
use crate::ports::ChargeRepository;

#[derive(Debug, Clone)]
pub struct GetChargeQuery {
    pub charge_id: ChargeId,
}

/// Reads a charge from the local store.
///
/// Status and URLs are whatever the last applied notice left.
pub struct GetChargeHandler {
    charges: Arc<dyn ChargeRepository>,
}

impl GetChargeHandler {
    pub fn new(charges: Arc<dyn ChargeRepository>) -> Self {
        Self { charges }
    }

    pub async fn handle(&self, query: GetChargeQuery) -> Result<Charge, BillingError> {
        self.charges
            .find_by_id(&query.charge_id)
            .await?
            .ok_or_else(|| BillingError::not_found("charge", &query.charge_id))
    }
}
