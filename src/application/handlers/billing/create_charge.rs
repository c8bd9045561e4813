//! CreateChargeHandler - Command handler for charging an existing customer.

use std::sync::Arc;

use crate::domain::billing::{BillingError, Charge, ChargeTerms, RemoteChargeState};
use crate::domain::foundation::{ChargeId, CustomerId};
use crate::ports::{ChargeRepository, CustomerRepository, NewCharge, PaymentGateway};

use super::consistency_gap;

/// Command to create a charge.
#[derive(Debug, Clone)]
pub struct CreateChargeCommand {
    pub customer_id: CustomerId,
    pub terms: ChargeTerms,
}

#[derive(Debug, Clone)]
pub struct CreateChargeResult {
    pub charge: Charge,
}

/// Handler for creating charges.
///
/// Everything before the gateway create is read-only, so a missing customer
/// (locally or on the gateway) leaves no orphan object behind.
pub struct CreateChargeHandler {
    customers: Arc<dyn CustomerRepository>,
    charges: Arc<dyn ChargeRepository>,
    gateway: Arc<dyn PaymentGateway>,
}

impl CreateChargeHandler {
    pub fn new(
        customers: Arc<dyn CustomerRepository>,
        charges: Arc<dyn ChargeRepository>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            customers,
            charges,
            gateway,
        }
    }

    pub async fn handle(&self, cmd: CreateChargeCommand) -> Result<CreateChargeResult, BillingError> {
        // 1. Validate input and parent
        cmd.terms.validate()?;
        if self.customers.find_by_id(&cmd.customer_id).await?.is_none() {
            return Err(BillingError::not_found("customer", &cmd.customer_id));
        }

        // 2. New local id
        let id = ChargeId::generate();

        // 3. Resolve the customer's gateway id
        let remote_customer = self
            .gateway
            .find_customer_by_reference(cmd.customer_id.as_str())
            .await?
            .ok_or_else(|| BillingError::remote_not_found("customer", &cmd.customer_id))?;

        // 4. Create remotely, then persist
        let remote = self
            .gateway
            .create_charge(&NewCharge {
                customer: remote_customer.id,
                external_reference: id.to_string(),
                terms: cmd.terms.clone(),
            })
            .await?;

        let remote_id = remote.id.clone();
        let charge = Charge::register(
            id,
            cmd.customer_id,
            cmd.terms,
            RemoteChargeState {
                remote_id: remote.id,
                status: remote.status,
                invoice_url: remote.invoice_url,
                receipt_url: remote.receipt_url,
            },
        );

        if let Err(err) = self.charges.save(&charge).await {
            return Err(consistency_gap("charge", charge.id().as_str(), &remote_id, err));
        }

        tracing::info!(
            charge_id = %charge.id(),
            remote_id = %remote_id,
            customer_id = %charge.customer_id,
            status = %charge.status,
            "Charge created"
        );

        Ok(CreateChargeResult { charge })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::{boleto_terms, Fixture};
    use crate::domain::billing::GatewayError;
    use crate::domain::foundation::ErrorCode;
    use rust_decimal::Decimal;

    fn handler(fx: &Fixture) -> CreateChargeHandler {
        CreateChargeHandler::new(fx.customers(), fx.charges(), fx.gateway())
    }

    fn command(customer: &str) -> CreateChargeCommand {
        CreateChargeCommand {
            customer_id: CustomerId::new(customer).unwrap(),
            terms: boleto_terms(),
        }
    }

    #[tokio::test]
    async fn pending_charge_is_persisted_with_gateway_id() {
        let fx = Fixture::new();
        fx.seed_customer("cust-1").await;

        let charge = handler(&fx).handle(command("cust-1")).await.unwrap().charge;

        assert_eq!(charge.remote_id().unwrap().as_str(), "gw-pay-1");
        assert_eq!(charge.status.as_str(), "PENDING");
        assert_eq!(charge.terms.value, Decimal::new(15000, 2));
        assert!(charge.subscription_id.is_none());

        let stored = fx.charges().find_by_id(charge.id()).await.unwrap().unwrap();
        assert_eq!(stored.remote_id(), charge.remote_id());
    }

    #[tokio::test]
    async fn gateway_charge_carries_local_id_and_remote_customer() {
        let fx = Fixture::new();
        fx.seed_customer("cust-1").await;

        let charge = handler(&fx).handle(command("cust-1")).await.unwrap().charge;

        let remote = fx.gateway.charge("gw-pay-1").unwrap();
        assert_eq!(remote.external_reference.as_deref(), Some(charge.id().as_str()));
        assert_eq!(remote.customer.as_deref(), Some("gw-cust-1"));
    }

    #[tokio::test]
    async fn unknown_customer_fails_before_any_gateway_call() {
        let fx = Fixture::new();

        let err = handler(&fx).handle(command("cust-404")).await.unwrap_err();

        assert_eq!(err.code(), ErrorCode::CustomerNotFound);
        assert!(fx.gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn customer_missing_on_gateway_creates_nothing() {
        let fx = Fixture::new();
        let customer = crate::domain::billing::Customer::register(
            CustomerId::new("cust-2").unwrap(),
            crate::domain::foundation::GatewayId::new("gw-elsewhere").unwrap(),
            crate::application::handlers::test_support::profile(),
        );
        fx.customers().save(&customer).await.unwrap();

        let err = handler(&fx).handle(command("cust-2")).await.unwrap_err();

        assert_eq!(err.code(), ErrorCode::RemoteNotFound);
        assert_eq!(fx.gateway.mutating_call_count(), 0);
    }

    #[tokio::test]
    async fn gateway_timeout_is_returned_verbatim() {
        let fx = Fixture::new();
        fx.seed_customer("cust-1").await;
        let mutations = fx.store.mutation_count();
        fx.gateway
            .set_method_error("create_charge", GatewayError::timeout("create_charge timed out"));

        let err = handler(&fx).handle(command("cust-1")).await.unwrap_err();

        match err {
            BillingError::Gateway(inner) => assert_eq!(inner.message, "create_charge timed out"),
            other => panic!("expected gateway error, got {:?}", other),
        }
        assert_eq!(fx.store.mutation_count(), mutations);
    }

    #[tokio::test]
    async fn zero_value_is_rejected() {
        let fx = Fixture::new();
        fx.seed_customer("cust-1").await;
        let mut cmd = command("cust-1");
        cmd.terms.value = Decimal::ZERO;

        let err = handler(&fx).handle(cmd).await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn persist_failure_reports_consistency_gap() {
        let fx = Fixture::new();
        fx.seed_customer("cust-1").await;
        fx.store.fail_next_save("charge");

        let err = handler(&fx).handle(command("cust-1")).await.unwrap_err();

        match err {
            BillingError::ConsistencyGap { remote_id, .. } => assert_eq!(remote_id, "gw-pay-1"),
            other => panic!("expected consistency gap, got {:?}", other),
        }
        assert!(fx.store.charges().await.is_empty());
    }
}
