//! StatusSynchronizer - mirrors a gateway status transition onto the local record.
//!
//! The record is found by the notice's external reference. No match is not an
//! error: the notice may have raced ahead of our own write, or concern an
//! object this system never created.

use std::sync::Arc;

use crate::domain::billing::{BillingError, Charge, GatewayStatus, Invoice, Subscription};
use crate::domain::webhook::{ChargeEvent, ChargeNotice, InvoiceNotice, SubscriptionNotice};
use crate::ports::{ChargeRepository, InvoiceRepository, SubscriptionRepository};

use super::issue_invoice::{InvoiceIssuer, IssueOutcome};

/// Result of applying a notice.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome<T> {
    /// No local record carries the notice's reference; nothing was written.
    Unmatched,
    Applied(T),
}

/// A charge after its status was applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ChargeSync {
    pub charge: Charge,
    /// Set when the event made the charge collectable.
    pub invoice: Option<IssueOutcome>,
}

pub struct StatusSynchronizer {
    charges: Arc<dyn ChargeRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    invoices: Arc<dyn InvoiceRepository>,
    issuer: Arc<InvoiceIssuer>,
}

impl StatusSynchronizer {
    pub fn new(
        charges: Arc<dyn ChargeRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        invoices: Arc<dyn InvoiceRepository>,
        issuer: Arc<InvoiceIssuer>,
    ) -> Self {
        Self {
            charges,
            subscriptions,
            invoices,
            issuer,
        }
    }

    /// Applies a charge notice; collectable events or statuses then issue the
    /// invoice.
    pub async fn sync_charge(
        &self,
        event: ChargeEvent,
        notice: &ChargeNotice,
    ) -> Result<SyncOutcome<ChargeSync>, BillingError> {
        let status = required_status(notice.status.as_deref(), event.as_str())?;

        let Some(reference) = notice.external_reference() else {
            tracing::debug!(event = event.as_str(), "Charge notice without external reference");
            return Ok(SyncOutcome::Unmatched);
        };
        let Some(mut charge) = self.charges.find_by_external_reference(reference).await? else {
            tracing::debug!(event = event.as_str(), reference, "No local charge for notice");
            return Ok(SyncOutcome::Unmatched);
        };

        self.charges
            .update_status(
                charge.id(),
                &status,
                notice.invoice_url.as_deref(),
                notice.transaction_receipt_url.as_deref(),
            )
            .await?;
        charge.apply_status(
            status,
            notice.invoice_url.clone(),
            notice.transaction_receipt_url.clone(),
        );

        tracing::info!(
            charge_id = %charge.id(),
            event = event.as_str(),
            status = %charge.status,
            "Charge status synchronized"
        );

        // A generic update can still carry a settled status
        let invoice = if event.triggers_invoice() || charge.status.is_collectable() {
            Some(self.issuer.issue_for(&charge).await?)
        } else {
            None
        };

        Ok(SyncOutcome::Applied(ChargeSync { charge, invoice }))
    }

    pub async fn sync_subscription(
        &self,
        notice: &SubscriptionNotice,
    ) -> Result<SyncOutcome<Subscription>, BillingError> {
        let status = required_status(notice.status.as_deref(), "subscription")?;

        let Some(reference) = notice.external_reference() else {
            return Ok(SyncOutcome::Unmatched);
        };
        let Some(mut subscription) = self
            .subscriptions
            .find_by_external_reference(reference)
            .await?
        else {
            tracing::debug!(reference, "No local subscription for notice");
            return Ok(SyncOutcome::Unmatched);
        };

        self.subscriptions
            .update_status(subscription.id(), &status)
            .await?;
        subscription.apply_status(status);

        tracing::info!(
            subscription_id = %subscription.id(),
            status = %subscription.status,
            "Subscription status synchronized"
        );
        Ok(SyncOutcome::Applied(subscription))
    }

    pub async fn sync_invoice(
        &self,
        notice: &InvoiceNotice,
    ) -> Result<SyncOutcome<Invoice>, BillingError> {
        let status = required_status(notice.status.as_deref(), "invoice")?;

        let Some(reference) = notice.external_reference() else {
            return Ok(SyncOutcome::Unmatched);
        };
        let Some(mut invoice) = self.invoices.find_by_external_reference(reference).await? else {
            tracing::debug!(reference, "No local invoice for notice");
            return Ok(SyncOutcome::Unmatched);
        };

        self.invoices.update_status(invoice.id(), &status).await?;
        invoice.apply_status(status);

        tracing::info!(
            invoice_id = %invoice.id(),
            status = %invoice.status,
            "Invoice status synchronized"
        );
        Ok(SyncOutcome::Applied(invoice))
    }
}

fn required_status(status: Option<&str>, what: &str) -> Result<GatewayStatus, BillingError> {
    match status.map(str::trim) {
        Some(s) if !s.is_empty() => Ok(GatewayStatus::new(s)),
        _ => Err(BillingError::malformed(format!("{} notice without status", what))),
    }
}
