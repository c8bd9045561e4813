//! GetSubscriptionHandler - Query handler for a single subscription.

use std::sync::Arc;

use crate::domain::billing::{BillingError, Subscription};
use crate::domain::foundation::SubscriptionId;
use crate::ports::SubscriptionRepository;

#[derive(Debug, Clone)]
pub struct GetSubscriptionQuery {
    pub subscription_id: SubscriptionId,
}

pub struct GetSubscriptionHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
}

impl GetSubscriptionHandler {
    pub fn new(subscriptions: Arc<dyn SubscriptionRepository>) -> Self {
        Self { subscriptions }
    }

    pub async fn handle(&self, query: GetSubscriptionQuery) -> Result<Subscription, BillingError> {
        self.subscriptions
            .find_by_id(&query.subscription_id)
            .await?
            .ok_or_else(|| BillingError::not_found("subscription", &query.subscription_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::Fixture;

    #[tokio::test]
    async fn returns_subscription_with_remote_id() {
        let fx = Fixture::new();
        fx.seed_subscription("local-sub-5", "gw-sub-9", "cust-1").await;

        let found = GetSubscriptionHandler::new(fx.subscriptions())
            .handle(GetSubscriptionQuery {
                subscription_id: SubscriptionId::new("local-sub-5").unwrap(),
            })
            .await
            .unwrap();

        assert_eq!(found.remote_id().unwrap().as_str(), "gw-sub-9");
        assert_eq!(found.customer_id.as_str(), "cust-1");
    }
}
