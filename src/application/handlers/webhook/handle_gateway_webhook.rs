//! HandleGatewayWebhookHandler - Command handler for inbound gateway notifications.
//!
//! Classifies the notification and hands it to the synchronizer or the
//! materializer. Every failure fails the whole delivery so the gateway
//! redelivers; issuance is idempotent and unmatched notices are no-ops, which
//! makes redelivery safe.

use std::sync::Arc;

use crate::domain::billing::{BillingError, GatewayStatus};
use crate::domain::foundation::{ChargeId, InvoiceId, SubscriptionId};
use crate::domain::webhook::{classify, GatewayEvent, WebhookNotification, WebhookRoute};

use super::issue_invoice::IssueOutcome;
use super::materialize_charge::{MaterializeOutcome, OrphanChargeMaterializer};
use super::sync_status::{StatusSynchronizer, SyncOutcome};

#[derive(Debug, Clone)]
pub struct HandleGatewayWebhookCommand {
    pub notification: WebhookNotification,
}

/// What a delivery did.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookOutcome {
    /// Creation notice with nothing to do.
    Acknowledged(GatewayEvent),
    /// No local record for the notice's reference.
    Unmatched(GatewayEvent),
    ChargeSynced {
        charge_id: ChargeId,
        status: GatewayStatus,
        invoice: Option<IssueOutcome>,
    },
    SubscriptionSynced {
        subscription_id: SubscriptionId,
        status: GatewayStatus,
    },
    InvoiceSynced {
        invoice_id: InvoiceId,
        status: GatewayStatus,
    },
    ChargeMaterialized(ChargeId),
    AlreadyMaterialized(ChargeId),
    SubscriptionOutOfScope,
}

impl WebhookOutcome {
    /// Short machine-readable name, returned to the gateway.
    pub fn label(&self) -> &'static str {
        match self {
            WebhookOutcome::Acknowledged(_) => "acknowledged",
            WebhookOutcome::Unmatched(_) => "unmatched",
            WebhookOutcome::ChargeSynced {
                invoice: Some(IssueOutcome::Issued(_)),
                ..
            } => "charge_synced_invoice_issued",
            WebhookOutcome::ChargeSynced { .. } => "charge_synced",
            WebhookOutcome::SubscriptionSynced { .. } => "subscription_synced",
            WebhookOutcome::InvoiceSynced { .. } => "invoice_synced",
            WebhookOutcome::ChargeMaterialized(_) => "charge_materialized",
            WebhookOutcome::AlreadyMaterialized(_) => "already_materialized",
            WebhookOutcome::SubscriptionOutOfScope => "subscription_out_of_scope",
        }
    }
}

pub struct HandleGatewayWebhookHandler {
    synchronizer: Arc<StatusSynchronizer>,
    materializer: Arc<OrphanChargeMaterializer>,
}

impl HandleGatewayWebhookHandler {
    pub fn new(
        synchronizer: Arc<StatusSynchronizer>,
        materializer: Arc<OrphanChargeMaterializer>,
    ) -> Self {
        Self {
            synchronizer,
            materializer,
        }
    }

    pub async fn handle(
        &self,
        cmd: HandleGatewayWebhookCommand,
    ) -> Result<WebhookOutcome, BillingError> {
        let event_name = cmd.notification.event.clone();
        let route = classify(cmd.notification).map_err(|err| {
            tracing::warn!(event = %event_name, error = %err, "Rejected webhook notification");
            err
        })?;

        let outcome = match route {
            WebhookRoute::Acknowledge(event) => WebhookOutcome::Acknowledged(event),

            WebhookRoute::MaterializeCharge(notice) => {
                match self.materializer.materialize(&notice).await? {
                    MaterializeOutcome::Materialized(charge) => {
                        WebhookOutcome::ChargeMaterialized(charge.id().clone())
                    }
                    MaterializeOutcome::AlreadyMaterialized(id) => {
                        WebhookOutcome::AlreadyMaterialized(id)
                    }
                    MaterializeOutcome::OutOfScope => WebhookOutcome::SubscriptionOutOfScope,
                }
            }

            WebhookRoute::SyncCharge { event, notice } => {
                match self.synchronizer.sync_charge(event, &notice).await? {
                    SyncOutcome::Applied(sync) => WebhookOutcome::ChargeSynced {
                        charge_id: sync.charge.id().clone(),
                        status: sync.charge.status,
                        invoice: sync.invoice,
                    },
                    SyncOutcome::Unmatched => WebhookOutcome::Unmatched(GatewayEvent::Charge(event)),
                }
            }

            WebhookRoute::SyncSubscription { event, notice } => {
                match self.synchronizer.sync_subscription(&notice).await? {
                    SyncOutcome::Applied(subscription) => WebhookOutcome::SubscriptionSynced {
                        subscription_id: subscription.id().clone(),
                        status: subscription.status,
                    },
                    SyncOutcome::Unmatched => {
                        WebhookOutcome::Unmatched(GatewayEvent::Subscription(event))
                    }
                }
            }

            WebhookRoute::SyncInvoice { event, notice } => {
                match self.synchronizer.sync_invoice(&notice).await? {
                    SyncOutcome::Applied(invoice) => WebhookOutcome::InvoiceSynced {
                        invoice_id: invoice.id().clone(),
                        status: invoice.status,
                    },
                    SyncOutcome::Unmatched => WebhookOutcome::Unmatched(GatewayEvent::Invoice(event)),
                }
            }
        };

        tracing::debug!(event = %event_name, outcome = outcome.label(), "Webhook processed");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::Fixture;
    use crate::application::handlers::webhook::InvoiceIssuer;
    use crate::domain::billing::InvoiceDefaults;
    use crate::domain::foundation::ErrorCode;
    use crate::domain::webhook::{ChargeNotice, InvoiceNotice};

    fn handler(fx: &Fixture) -> HandleGatewayWebhookHandler {
        let issuer = Arc::new(InvoiceIssuer::new(
            fx.charges(),
            fx.invoices(),
            fx.gateway(),
            InvoiceDefaults::default(),
        ));
        HandleGatewayWebhookHandler::new(
            Arc::new(StatusSynchronizer::new(
                fx.charges(),
                fx.subscriptions(),
                fx.invoices(),
                issuer,
            )),
            Arc::new(OrphanChargeMaterializer::new(
                fx.charges(),
                fx.subscriptions(),
                fx.gateway(),
            )),
        )
    }

    fn command(event: &str) -> HandleGatewayWebhookCommand {
        HandleGatewayWebhookCommand {
            notification: WebhookNotification {
                event: event.to_string(),
                payment: None,
                invoice: None,
                subscription: None,
            },
        }
    }

    #[tokio::test]
    async fn unknown_event_is_rejected_without_side_effects() {
        let fx = Fixture::new();

        let err = handler(&fx)
            .handle(command("SOMETHING_UNKNOWN"))
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::UnsupportedEvent);
        assert_eq!(fx.store.mutation_count(), 0);
        assert!(fx.gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn charge_event_without_payment_is_malformed() {
        let fx = Fixture::new();

        let err = handler(&fx)
            .handle(command("PAYMENT_RECEIVED"))
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::MalformedPayload);
    }

    #[tokio::test]
    async fn bare_creation_notice_is_acknowledged() {
        let fx = Fixture::new();
        let mut cmd = command("PAYMENT_CREATED");
        cmd.notification.payment = Some(ChargeNotice {
            id: Some("gw-pay-3".to_string()),
            status: Some("PENDING".to_string()),
            ..ChargeNotice::default()
        });

        let outcome = handler(&fx).handle(cmd).await.unwrap();

        assert_eq!(outcome.label(), "acknowledged");
        assert_eq!(fx.store.mutation_count(), 0);
    }

    #[tokio::test]
    async fn invoice_notice_for_unknown_reference_is_unmatched() {
        let fx = Fixture::new();
        let mut cmd = command("INVOICE_AUTHORIZED");
        cmd.notification.invoice = Some(InvoiceNotice {
            external_reference: Some("ch-404".to_string()),
            status: Some("AUTHORIZED".to_string()),
            ..InvoiceNotice::default()
        });

        let outcome = handler(&fx).handle(cmd).await.unwrap();

        assert!(matches!(outcome, WebhookOutcome::Unmatched(GatewayEvent::Invoice(_))));
        assert_eq!(outcome.label(), "unmatched");
    }
}
