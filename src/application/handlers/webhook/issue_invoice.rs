//! InvoiceIssuer - issues the fiscal invoice for a collectable charge, once.
//!
//! The guard is a lookup by charge id before every attempt. The storage
//! layer's unique key on `invoices.charge_id` catches the concurrent case the
//! lookup cannot see.

use std::sync::Arc;

use crate::application::handlers::billing::{CreateInvoiceCommand, CreateInvoiceHandler};
use crate::domain::billing::{BillingError, Charge, Invoice, InvoiceDefaults};
use crate::domain::foundation::Timestamp;
use crate::ports::{ChargeRepository, InvoiceRepository, PaymentGateway};

/// What the issuer did for a charge.
#[derive(Debug, Clone, PartialEq)]
pub enum IssueOutcome {
    Issued(Invoice),
    /// The charge already had an invoice; nothing was sent to the gateway.
    AlreadyIssued(Invoice),
}

impl IssueOutcome {
    pub fn invoice(&self) -> &Invoice {
        match self {
            IssueOutcome::Issued(invoice) | IssueOutcome::AlreadyIssued(invoice) => invoice,
        }
    }
}

pub struct InvoiceIssuer {
    invoices: Arc<dyn InvoiceRepository>,
    create_invoice: CreateInvoiceHandler,
    defaults: InvoiceDefaults,
}

impl InvoiceIssuer {
    pub fn new(
        charges: Arc<dyn ChargeRepository>,
        invoices: Arc<dyn InvoiceRepository>,
        gateway: Arc<dyn PaymentGateway>,
        defaults: InvoiceDefaults,
    ) -> Self {
        Self {
            create_invoice: CreateInvoiceHandler::new(charges, invoices.clone(), gateway),
            invoices,
            defaults,
        }
    }

    /// Issues an invoice for `charge` unless one exists.
    ///
    /// Failures propagate; redelivery of the triggering notice retries.
    pub async fn issue_for(&self, charge: &Charge) -> Result<IssueOutcome, BillingError> {
        if let Some(existing) = self.invoices.find_by_charge_id(charge.id()).await? {
            tracing::info!(
                charge_id = %charge.id(),
                invoice_id = %existing.id(),
                "Invoice already issued for charge"
            );
            return Ok(IssueOutcome::AlreadyIssued(existing));
        }

        let details = self.defaults.details_for(charge, Timestamp::now().date());
        let cmd = CreateInvoiceCommand {
            charge_id: charge.id().clone(),
            external_reference: None,
            details,
        };

        match self.create_invoice.handle(cmd).await {
            Ok(result) => Ok(IssueOutcome::Issued(result.invoice)),
            Err(BillingError::InvoiceAlreadyIssued { .. }) => {
                // Another delivery issued it between our check and the create.
                let existing = self
                    .invoices
                    .find_by_charge_id(charge.id())
                    .await?
                    .ok_or_else(|| BillingError::not_found("invoice", charge.id()))?;
                Ok(IssueOutcome::AlreadyIssued(existing))
            }
            Err(err) => {
                tracing::warn!(charge_id = %charge.id(), error = %err, "Invoice issuance failed");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::{
        boleto_terms, rival_invoice, Fixture, RacingInvoices,
    };
    use crate::domain::billing::{GatewayError, GatewayStatus, RemoteChargeState};
    use crate::domain::foundation::{ChargeId, CustomerId, GatewayId};
    use crate::ports::GatewayCharge;
    use rust_decimal::Decimal;

    fn issuer(fx: &Fixture) -> InvoiceIssuer {
        InvoiceIssuer::new(
            fx.charges(),
            fx.invoices(),
            fx.gateway(),
            InvoiceDefaults::default(),
        )
    }

    async fn received_charge(fx: &Fixture, description: Option<&str>) -> Charge {
        let mut terms = boleto_terms();
        terms.description = description.map(String::from);
        let charge = Charge::register(
            ChargeId::new("ch-1").unwrap(),
            CustomerId::new("cust-1").unwrap(),
            terms,
            RemoteChargeState {
                remote_id: GatewayId::new("gw-pay-1").unwrap(),
                status: GatewayStatus::new("RECEIVED"),
                invoice_url: None,
                receipt_url: None,
            },
        );
        fx.gateway.add_charge(GatewayCharge {
            id: GatewayId::new("gw-pay-1").unwrap(),
            customer: None,
            subscription: None,
            status: GatewayStatus::new("RECEIVED"),
            value: Some(charge.terms.value),
            due_date: Some(charge.terms.due_date),
            external_reference: Some("ch-1".to_string()),
            invoice_url: None,
            receipt_url: None,
        });
        fx.charges().save(&charge).await.unwrap();
        charge
    }

    #[tokio::test]
    async fn first_call_issues_with_fiscal_defaults() {
        let fx = Fixture::new();
        let charge = received_charge(&fx, None).await;

        let outcome = issuer(&fx).issue_for(&charge).await.unwrap();

        let invoice = match outcome {
            IssueOutcome::Issued(invoice) => invoice,
            other => panic!("expected issued, got {:?}", other),
        };
        assert_eq!(invoice.details.value, Decimal::new(15000, 2));
        assert_eq!(invoice.details.municipal_service_code.as_deref(), Some("01.03.01"));
        assert_eq!(invoice.details.taxes.iss, Decimal::new(5, 0));
        assert!(!invoice.details.taxes.retain_iss);
        assert_eq!(invoice.details.service_description, "Charge ch-1");
        assert_eq!(invoice.details.effective_date, Timestamp::now().date());
    }

    #[tokio::test]
    async fn repeated_calls_issue_exactly_one_invoice() {
        let fx = Fixture::new();
        let charge = received_charge(&fx, Some("Hosting")).await;
        let issuer = issuer(&fx);

        for _ in 0..4 {
            issuer.issue_for(&charge).await.unwrap();
        }

        assert_eq!(fx.store.invoice_count_for(charge.id()).await, 1);
        assert_eq!(fx.gateway.invoice_count(), 1);
        let last = issuer.issue_for(&charge).await.unwrap();
        assert!(matches!(last, IssueOutcome::AlreadyIssued(_)));
        assert_eq!(last.invoice().details.service_description, "Hosting");
    }

    #[tokio::test]
    async fn gateway_failure_propagates_and_next_attempt_succeeds() {
        let fx = Fixture::new();
        let charge = received_charge(&fx, None).await;
        let issuer = issuer(&fx);
        fx.gateway
            .set_method_error("create_invoice", GatewayError::provider("fiscal service down"));

        let err = issuer.issue_for(&charge).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(fx.store.invoice_count_for(charge.id()).await, 0);

        fx.gateway.clear_errors();
        let outcome = issuer.issue_for(&charge).await.unwrap();
        assert!(matches!(outcome, IssueOutcome::Issued(_)));
    }

    #[tokio::test]
    async fn invoice_issued_between_checks_is_reported_as_already_issued() {
        let fx = Fixture::new();
        let charge = received_charge(&fx, None).await;
        // Our own check misses it; the create handler's check sees it
        let racing = Arc::new(RacingInvoices::new(
            fx.store.clone(),
            rival_invoice(&charge, "inv_rival"),
            1,
        ));
        let issuer = InvoiceIssuer::new(
            fx.charges(),
            racing,
            fx.gateway(),
            InvoiceDefaults::default(),
        );

        let outcome = issuer.issue_for(&charge).await.unwrap();

        match outcome {
            IssueOutcome::AlreadyIssued(invoice) => {
                assert_eq!(invoice.remote_id().unwrap().as_str(), "inv_rival")
            }
            other => panic!("expected already issued, got {:?}", other),
        }
        assert!(!fx.gateway.was_called("create_invoice"));
        assert_eq!(fx.store.invoice_count_for(charge.id()).await, 1);
    }
}
