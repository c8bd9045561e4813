//! Subscription aggregate - recurring billing on the gateway.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    Correlation, CustomerId, GatewayId, SubscriptionId, Timestamp, ValidationError,
};

use super::values::{require_positive, BillingType, Cycle, GatewayStatus};

/// Recurrence plan requested by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionPlan {
    pub billing_type: BillingType,
    pub value: Decimal,
    pub cycle: Cycle,
    pub next_due_date: NaiveDate,
    pub description: Option<String>,
    pub end_date: Option<NaiveDate>,
    pub max_payments: Option<u32>,
}

impl SubscriptionPlan {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_positive("value", self.value)?;
        if let Some(end) = self.end_date {
            if end < self.next_due_date {
                return Err(ValidationError::invalid_format(
                    "end_date",
                    "must not precede next_due_date",
                ));
            }
        }
        if self.max_payments == Some(0) {
            return Err(ValidationError::not_positive("max_payments", 0));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub correlation: Correlation<SubscriptionId>,
    pub customer_id: CustomerId,
    pub plan: SubscriptionPlan,
    pub status: GatewayStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Subscription {
    pub fn register(
        id: SubscriptionId,
        customer_id: CustomerId,
        plan: SubscriptionPlan,
        remote_id: GatewayId,
        status: GatewayStatus,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            correlation: Correlation::bound(id, remote_id),
            customer_id,
            plan,
            status,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> &SubscriptionId {
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
