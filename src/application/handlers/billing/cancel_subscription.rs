//! CancelSubscriptionHandler - Command handler for ending recurring billing.

use std::sync::Arc;

use crate::domain::billing::{BillingError, Subscription};
use crate::domain::foundation::SubscriptionId;
use crate::ports::{PaymentGateway, SubscriptionRepository};

use super::consistency_gap;

#[derive(Debug, Clone)]
pub struct CancelSubscriptionCommand {
    pub subscription_id: SubscriptionId,
}

#[derive(Debug, Clone)]
pub struct CancelSubscriptionResult {
    pub subscription: Subscription,
}

/// Cancels on the gateway and mirrors the terminal status locally.
///
/// The local record is never removed; cancellation is another status value.
pub struct CancelSubscriptionHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    gateway: Arc<dyn PaymentGateway>,
}

impl CancelSubscriptionHandler {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            subscriptions,
            gateway,
        }
    }

    pub async fn handle(
        &self,
        cmd: CancelSubscriptionCommand,
    ) -> Result<CancelSubscriptionResult, BillingError> {
        let mut subscription = self
            .subscriptions
            .find_by_id(&cmd.subscription_id)
            .await?
            .ok_or_else(|| BillingError::not_found("subscription", &cmd.subscription_id))?;

        let remote = self
            .gateway
            .find_subscription_by_reference(cmd.subscription_id.as_str())
            .await?
            .ok_or_else(|| BillingError::remote_not_found("subscription", &cmd.subscription_id))?;

        let cancelled = self.gateway.cancel_subscription(&remote.id).await?;

        if let Err(err) = self
            .subscriptions
            .update_status(subscription.id(), &cancelled.status)
            .await
        {
            return Err(consistency_gap(
                "subscription",
                subscription.id().as_str(),
                &remote.id,
                err,
            ));
        }
        subscription.apply_status(cancelled.status);

        tracing::info!(
            subscription_id = %subscription.id(),
            remote_id = %remote.id,
            status = %subscription.status,
            "Subscription cancelled"
        );

        Ok(CancelSubscriptionResult { subscription })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::Fixture;
    use crate::domain::billing::GatewayError;
    use crate::domain::foundation::ErrorCode;

    fn handler(fx: &Fixture) -> CancelSubscriptionHandler {
        CancelSubscriptionHandler::new(fx.subscriptions(), fx.gateway())
    }

    #[tokio::test]
    async fn cancelled_status_is_mirrored_locally() {
        let fx = Fixture::new();
        fx.seed_subscription("local-sub-5", "gw-sub-9", "cust-1").await;

        let result = handler(&fx)
            .handle(CancelSubscriptionCommand {
                subscription_id: SubscriptionId::new("local-sub-5").unwrap(),
            })
            .await
            .unwrap();

        assert_eq!(result.subscription.status.as_str(), "INACTIVE");
        let stored = fx
            .subscriptions()
            .find_by_id(&SubscriptionId::new("local-sub-5").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status.as_str(), "INACTIVE");
        assert_eq!(fx.gateway.calls().last().unwrap().args[0], "gw-sub-9");
    }

    #[tokio::test]
    async fn unknown_subscription_is_not_found() {
        let fx = Fixture::new();

        let err = handler(&fx)
            .handle(CancelSubscriptionCommand {
                subscription_id: SubscriptionId::new("nope").unwrap(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::SubscriptionNotFound);
        assert!(fx.gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn gateway_failure_keeps_local_status() {
        let fx = Fixture::new();
        fx.seed_subscription("local-sub-5", "gw-sub-9", "cust-1").await;
        fx.gateway.set_method_error(
            "cancel_subscription",
            GatewayError::rejected("subscription already removed"),
        );

        let err = handler(&fx)
            .handle(CancelSubscriptionCommand {
                subscription_id: SubscriptionId::new("local-sub-5").unwrap(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, BillingError::Gateway(_)));
        let stored = fx
            .subscriptions()
            .find_by_id(&SubscriptionId::new("local-sub-5").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status.as_str(), "ACTIVE");
    }
}
