//! OrphanChargeMaterializer - records charges the gateway generated on its own.
//!
//! Subscription billing cycles create charges on the gateway without any
//! local request. The first notice for such a charge creates the local
//! record, then pushes the new local id back as the charge's external
//! reference so later notices correlate normally.

use std::sync::Arc;

use crate::domain::billing::{
    BillingError, BillingType, Charge, ChargeTerms, GatewayStatus, RemoteChargeState,
};
use crate::domain::foundation::{ChargeId, GatewayId};
use crate::domain::webhook::ChargeNotice;
use crate::ports::{ChargeRepository, PaymentGateway, SubscriptionRepository};

#[derive(Debug, Clone, PartialEq)]
pub enum MaterializeOutcome {
    Materialized(Charge),
    /// A local charge already exists for this notice.
    AlreadyMaterialized(ChargeId),
    /// The subscription is unknown locally; nothing is recorded.
    OutOfScope,
}

pub struct OrphanChargeMaterializer {
    charges: Arc<dyn ChargeRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    gateway: Arc<dyn PaymentGateway>,
}

impl OrphanChargeMaterializer {
    pub fn new(
        charges: Arc<dyn ChargeRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            charges,
            subscriptions,
            gateway,
        }
    }

    pub async fn materialize(
        &self,
        notice: &ChargeNotice,
    ) -> Result<MaterializeOutcome, BillingError> {
        let parts = NoticeParts::extract(notice)?;

        // 1. Already known, by our reference or by the gateway id
        if let Some(reference) = notice.external_reference() {
            if let Some(existing) = self.charges.find_by_external_reference(reference).await? {
                return Ok(already(existing));
            }
        }
        if let Some(existing) = self.charges.find_by_remote_id(&parts.remote_id).await? {
            // Known by gateway id only: an earlier back-reference push failed
            if notice.external_reference() != Some(existing.id().as_str()) {
                self.push_back_reference(&existing, &parts.remote_id).await?;
            }
            return Ok(already(existing));
        }

        // 2. Resolve the subscription to a local one
        let Some(remote_subscription) = self.gateway.get_subscription(&parts.subscription).await?
        else {
            tracing::debug!(subscription = %parts.subscription, "Subscription unknown to gateway");
            return Ok(MaterializeOutcome::OutOfScope);
        };
        let local_subscription = match remote_subscription.external_reference.as_deref() {
            Some(reference) => {
                self.subscriptions
                    .find_by_external_reference(reference)
                    .await?
            }
            None => None,
        };
        let Some(subscription) = local_subscription else {
            tracing::debug!(
                subscription = %parts.subscription,
                "Charge belongs to a subscription outside local scope"
            );
            return Ok(MaterializeOutcome::OutOfScope);
        };

        // 3. Create and persist the local charge
        let remote_id = parts.remote_id.clone();
        let charge = Charge::materialize(
            ChargeId::generate(),
            subscription.customer_id.clone(),
            subscription.id().clone(),
            parts.terms,
            RemoteChargeState {
                remote_id: parts.remote_id,
                status: parts.status,
                invoice_url: notice.invoice_url.clone(),
                receipt_url: notice.transaction_receipt_url.clone(),
            },
        );
        self.charges.save(&charge).await?;

        tracing::info!(
            charge_id = %charge.id(),
            remote_id = %remote_id,
            subscription_id = %subscription.id(),
            "Materialized gateway-generated charge"
        );

        // 4. Push the local id back to the gateway
        self.push_back_reference(&charge, &remote_id).await?;

        Ok(MaterializeOutcome::Materialized(charge))
    }

    /// Sets the charge's local id as its external reference on the gateway.
    ///
    /// Failure leaves the local charge in place and surfaces as a
    /// consistency gap, so the gateway redelivers and the push is retried.
    async fn push_back_reference(
        &self,
        charge: &Charge,
        remote_id: &GatewayId,
    ) -> Result<(), BillingError> {
        if let Err(err) = self
            .gateway
            .update_charge_reference(remote_id, charge.id().as_str())
            .await
        {
            tracing::error!(
                charge_id = %charge.id(),
                remote_id = %remote_id,
                error = %err,
                "Charge materialized locally but back-reference update failed"
            );
            return Err(BillingError::consistency_gap(
                "charge",
                charge.id(),
                remote_id,
                format!("back-reference update failed: {}", err),
            ));
        }
        tracing::info!(charge_id = %charge.id(), remote_id = %remote_id, "Back-reference pushed");
        Ok(())
    }
}

fn already(existing: Charge) -> MaterializeOutcome {
    tracing::info!(charge_id = %existing.id(), "Charge already materialized");
    MaterializeOutcome::AlreadyMaterialized(existing.id().clone())
}

/// Fields a creation notice must carry for the charge to be recorded.
struct NoticeParts {
    remote_id: GatewayId,
    subscription: GatewayId,
    status: GatewayStatus,
    terms: ChargeTerms,
}

impl NoticeParts {
    fn extract(notice: &ChargeNotice) -> Result<Self, BillingError> {
        let remote_id = notice
            .remote_id()
            .ok_or_else(|| BillingError::malformed("payment notice without id"))
            .and_then(|id| GatewayId::new(id).map_err(BillingError::from))?;
        let subscription = notice
            .subscription_reference()
            .ok_or_else(|| BillingError::malformed("payment notice without subscription"))
            .and_then(|id| GatewayId::new(id).map_err(BillingError::from))?;
        let status = notice
            .status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(GatewayStatus::new)
            .ok_or_else(|| BillingError::malformed("payment notice without status"))?;
        let value = notice
            .value
            .ok_or_else(|| BillingError::malformed("payment notice without value"))?;
        let due_date = notice
            .due_date
            .ok_or_else(|| BillingError::malformed("payment notice without dueDate"))?;

        // The gateway's vocabulary may outgrow ours; the charge is still real.
        let billing_type = notice
            .billing_type
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(BillingType::Undefined);

        Ok(Self {
            remote_id,
            subscription,
            status,
            terms: ChargeTerms {
                billing_type,
                value,
                due_date,
                description: notice.description.clone(),
                installment_count: None,
                callback: None,
            },
        })
    }
}
