//! CreateInvoiceHandler - Command handler for issuing a fiscal invoice for a charge.
//!
//! Shared by the invoice endpoint and the automatic issuer.

use std::sync::Arc;

use crate::domain::billing::{BillingError, Invoice, InvoiceDetails};
use crate::domain::foundation::{ChargeId, ErrorCode, InvoiceId, ValidationError};
use crate::ports::{ChargeRepository, InvoiceRepository, NewInvoice, PaymentGateway};

use super::consistency_gap;

/// Command to create an invoice.
#[derive(Debug, Clone)]
pub struct CreateInvoiceCommand {
    pub charge_id: ChargeId,
    /// Correlation sent to the gateway; defaults to the charge id.
    pub external_reference: Option<String>,
    pub details: InvoiceDetails,
}

#[derive(Debug, Clone)]
pub struct CreateInvoiceResult {
    pub invoice: Invoice,
}

pub struct CreateInvoiceHandler {
    charges: Arc<dyn ChargeRepository>,
    invoices: Arc<dyn InvoiceRepository>,
    gateway: Arc<dyn PaymentGateway>,
}

impl CreateInvoiceHandler {
    pub fn new(
        charges: Arc<dyn ChargeRepository>,
        invoices: Arc<dyn InvoiceRepository>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            charges,
            invoices,
            gateway,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateInvoiceCommand,
    ) -> Result<CreateInvoiceResult, BillingError> {
        // 1. Validate input, parent, and the one-invoice rule
        cmd.details.validate()?;
        if self.charges.find_by_id(&cmd.charge_id).await?.is_none() {
            return Err(BillingError::not_found("charge", &cmd.charge_id));
        }
        if self.invoices.find_by_charge_id(&cmd.charge_id).await?.is_some() {
            return Err(BillingError::InvoiceAlreadyIssued {
                charge_id: cmd.charge_id.to_string(),
            });
        }

        // 2. New local id and a reference no other invoice holds
        let id = InvoiceId::generate();
        let external_reference = cmd
            .external_reference
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| cmd.charge_id.to_string());
        if self
            .invoices
            .find_by_external_reference(&external_reference)
            .await?
            .is_some()
        {
            return Err(ValidationError::invalid_format(
                "external_reference",
                format!("{} is already used by another invoice", external_reference),
            )
            .into());
        }

        // 3. Resolve the charge's gateway id
        let remote_charge = self
            .gateway
            .find_charge_by_reference(cmd.charge_id.as_str())
            .await?
            .ok_or_else(|| BillingError::remote_not_found("charge", &cmd.charge_id))?;

        // 4. Create remotely, then persist
        let remote = self
            .gateway
            .create_invoice(&NewInvoice {
                charge: remote_charge.id,
                external_reference: external_reference.clone(),
                details: cmd.details.clone(),
            })
            .await?;

        let remote_id = remote.id.clone();
        let invoice = Invoice::register(
            id,
            cmd.charge_id,
            external_reference,
            cmd.details,
            remote.id,
            remote.status,
            remote.payment_link,
        );

        if let Err(err) = self.invoices.save(&invoice).await {
            // A concurrent issuer won the unique key after our existence check.
            if err.code == ErrorCode::InvoiceAlreadyIssued {
                tracing::warn!(
                    charge_id = %invoice.charge_id,
                    remote_id = %remote_id,
                    "Lost invoice race; gateway invoice has no local record"
                );
            }
            return Err(consistency_gap("invoice", invoice.id().as_str(), &remote_id, err));
        }

        tracing::info!(
            invoice_id = %invoice.id(),
            charge_id = %invoice.charge_id,
            remote_id = %remote_id,
            "Invoice created"
        );

        Ok(CreateInvoiceResult { invoice })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::{
        boleto_terms, rival_invoice, Fixture, RacingInvoices,
    };
    use crate::domain::billing::{Charge, InvoiceDefaults, RemoteChargeState, GatewayStatus};
    use crate::domain::foundation::{CustomerId, GatewayId};
    use crate::ports::GatewayCharge;
    use chrono::NaiveDate;

    fn handler(fx: &Fixture) -> CreateInvoiceHandler {
        CreateInvoiceHandler::new(fx.charges(), fx.invoices(), fx.gateway())
    }

    /// Charge known on both sides, correlated by its local id.
    async fn seed_charge(fx: &Fixture) -> Charge {
        let charge = Charge::register(
            ChargeId::new("ch-1").unwrap(),
            CustomerId::new("cust-1").unwrap(),
            boleto_terms(),
            RemoteChargeState {
                remote_id: GatewayId::new("gw-pay-7").unwrap(),
                status: GatewayStatus::new("RECEIVED"),
                invoice_url: None,
                receipt_url: None,
            },
        );
        fx.gateway.add_charge(GatewayCharge {
            id: GatewayId::new("gw-pay-7").unwrap(),
            customer: Some("gw-cust-1".to_string()),
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

    fn command(charge: &Charge, reference: Option<&str>) -> CreateInvoiceCommand {
        let today = NaiveDate::from_ymd_opt(2025, 1, 12).unwrap();
        CreateInvoiceCommand {
            charge_id: charge.id().clone(),
            external_reference: reference.map(String::from),
            details: InvoiceDefaults::default().details_for(charge, today),
        }
    }

    #[tokio::test]
    async fn external_reference_defaults_to_charge_id() {
        let fx = Fixture::new();
        let charge = seed_charge(&fx).await;

        let invoice = handler(&fx).handle(command(&charge, None)).await.unwrap().invoice;

        assert_eq!(invoice.external_reference, "ch-1");
        assert_eq!(invoice.status.as_str(), "SCHEDULED");
        assert!(invoice.payment_link.is_some());
        let call = fx
            .gateway
            .calls()
            .into_iter()
            .find(|c| c.method == "create_invoice")
            .unwrap();
        assert_eq!(call.args[0], "gw-pay-7");
        assert_eq!(call.args[1], "ch-1");
    }

    #[tokio::test]
    async fn caller_supplied_reference_is_sent() {
        let fx = Fixture::new();
        let charge = seed_charge(&fx).await;

        let invoice = handler(&fx)
            .handle(command(&charge, Some("nf-2025-001")))
            .await
            .unwrap()
            .invoice;

        assert_eq!(invoice.external_reference, "nf-2025-001");
        let found = fx
            .invoices()
            .find_by_external_reference("nf-2025-001")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.remote_id(), invoice.remote_id());
    }

    #[tokio::test]
    async fn second_invoice_for_same_charge_is_refused_before_gateway() {
        let fx = Fixture::new();
        let charge = seed_charge(&fx).await;
        handler(&fx).handle(command(&charge, None)).await.unwrap();

        let err = handler(&fx).handle(command(&charge, None)).await.unwrap_err();

        assert!(matches!(err, BillingError::InvoiceAlreadyIssued { .. }));
        assert_eq!(fx.gateway.invoice_count(), 1);
    }

    #[tokio::test]
    async fn reference_held_by_another_invoice_is_refused_before_gateway() {
        let fx = Fixture::new();
        let charge = seed_charge(&fx).await;
        let other = Charge::register(
            ChargeId::new("ch-2").unwrap(),
            CustomerId::new("cust-1").unwrap(),
            boleto_terms(),
            RemoteChargeState {
                remote_id: GatewayId::new("gw-pay-8").unwrap(),
                status: GatewayStatus::new("RECEIVED"),
                invoice_url: None,
                receipt_url: None,
            },
        );
        fx.charges().save(&other).await.unwrap();
        fx.invoices().save(&rival_invoice(&other, "inv_other")).await.unwrap();

        let err = handler(&fx)
            .handle(command(&charge, Some("ch-2")))
            .await
            .unwrap_err();

        assert!(err.is_validation());
        assert_eq!(fx.gateway.invoice_count(), 0);
        assert!(!fx.gateway.was_called("find_charge_by_reference"));
    }

    #[tokio::test]
    async fn invoice_saved_concurrently_after_remote_create_is_a_consistency_gap() {
        let fx = Fixture::new();
        let charge = seed_charge(&fx).await;
        // The rival commits between our existence check and our save
        let racing = Arc::new(RacingInvoices::new(
            fx.store.clone(),
            rival_invoice(&charge, "inv_rival"),
            1,
        ));
        let handler = CreateInvoiceHandler::new(fx.charges(), racing, fx.gateway());

        let err = handler.handle(command(&charge, None)).await.unwrap_err();

        assert_eq!(err.code(), ErrorCode::ConsistencyGap);
        assert!(err.is_retryable());
        assert_eq!(fx.gateway.invoice_count(), 1);
        let kept = fx.invoices().find_by_charge_id(charge.id()).await.unwrap().unwrap();
        assert_eq!(kept.remote_id().unwrap().as_str(), "inv_rival");
        assert_eq!(fx.store.invoice_count_for(charge.id()).await, 1);
    }

    #[tokio::test]
    async fn missing_charge_is_not_found() {
        let fx = Fixture::new();
        let charge = seed_charge(&fx).await;
        let mut cmd = command(&charge, None);
        cmd.charge_id = ChargeId::new("ch-404").unwrap();

        let err = handler(&fx).handle(cmd).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ChargeNotFound);
    }

    #[tokio::test]
    async fn charge_unknown_to_gateway_creates_nothing() {
        let fx = Fixture::new();
        let charge = Charge::register(
            ChargeId::new("ch-local").unwrap(),
            CustomerId::new("cust-1").unwrap(),
            boleto_terms(),
            RemoteChargeState {
                remote_id: GatewayId::new("gw-pay-99").unwrap(),
                status: GatewayStatus::new("RECEIVED"),
                invoice_url: None,
                receipt_url: None,
            },
        );
        fx.charges().save(&charge).await.unwrap();

        let err = handler(&fx).handle(command(&charge, None)).await.unwrap_err();

        assert_eq!(err.code(), ErrorCode::RemoteNotFound);
        assert_eq!(fx.gateway.invoice_count(), 0);
    }
}
