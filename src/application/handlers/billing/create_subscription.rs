//! CreateSubscriptionHandler - Command handler for starting recurring billing.

use std::sync::Arc;

use crate::domain::billing::{BillingError, Subscription, SubscriptionPlan};
use crate::domain::foundation::{CustomerId, SubscriptionId};
use crate::ports::{CustomerRepository, NewSubscription, PaymentGateway, SubscriptionRepository};

use super::consistency_gap;

#[derive(Debug, Clone)]
pub struct CreateSubscriptionCommand {
    pub customer_id: CustomerId,
    pub plan: SubscriptionPlan,
}

#[derive(Debug, Clone)]
pub struct CreateSubscriptionResult {
    pub subscription: Subscription,
}

/// Handler for creating subscriptions.
///
/// The gateway later generates one charge per cycle on its own; those arrive
/// as creation notices and are materialized locally by the webhook pipeline.
pub struct CreateSubscriptionHandler {
    customers: Arc<dyn CustomerRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    gateway: Arc<dyn PaymentGateway>,
}

impl CreateSubscriptionHandler {
    pub fn new(
        customers: Arc<dyn CustomerRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            customers,
            subscriptions,
            gateway,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateSubscriptionCommand,
    ) -> Result<CreateSubscriptionResult, BillingError> {
        cmd.plan.validate()?;
        if self.customers.find_by_id(&cmd.customer_id).await?.is_none() {
            return Err(BillingError::not_found("customer", &cmd.customer_id));
        }

        let id = SubscriptionId::generate();

        let remote_customer = self
            .gateway
            .find_customer_by_reference(cmd.customer_id.as_str())
            .await?
            .ok_or_else(|| BillingError::remote_not_found("customer", &cmd.customer_id))?;

        let remote = self
            .gateway
            .create_subscription(&NewSubscription {
                customer: remote_customer.id,
                external_reference: id.to_string(),
                plan: cmd.plan.clone(),
            })
            .await?;

        let remote_id = remote.id.clone();
        let subscription =
            Subscription::register(id, cmd.customer_id, cmd.plan, remote.id, remote.status);

        if let Err(err) = self.subscriptions.save(&subscription).await {
            return Err(consistency_gap(
                "subscription",
                subscription.id().as_str(),
                &remote_id,
                err,
            ));
        }

        tracing::info!(
            subscription_id = %subscription.id(),
            remote_id = %remote_id,
            cycle = %subscription.plan.cycle,
            "Subscription created"
        );

        Ok(CreateSubscriptionResult { subscription })
    }
}
