//! CreateCustomerHandler - Command handler for registering a customer on both sides.

use std::sync::Arc;

use crate::domain::billing::{BillingError, Customer, CustomerProfile};
use crate::domain::foundation::CustomerId;
use crate::ports::{CustomerRepository, NewCustomer, PaymentGateway};

use super::consistency_gap;

/// Command to create a customer.
#[derive(Debug, Clone)]
pub struct CreateCustomerCommand {
    pub profile: CustomerProfile,
}

#[derive(Debug, Clone)]
pub struct CreateCustomerResult {
    pub customer: Customer,
}

/// Handler for creating customers.
///
/// Customers have no parent, so the flow is: validate, generate the local id,
/// create on the gateway with that id as external reference, persist.
pub struct CreateCustomerHandler {
    customers: Arc<dyn CustomerRepository>,
    gateway: Arc<dyn PaymentGateway>,
}

impl CreateCustomerHandler {
    pub fn new(customers: Arc<dyn CustomerRepository>, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { customers, gateway }
    }

    pub async fn handle(
        &self,
        cmd: CreateCustomerCommand,
    ) -> Result<CreateCustomerResult, BillingError> {
        cmd.profile.validate()?;

        let id = CustomerId::generate();
        let remote = self
            .gateway
            .create_customer(&NewCustomer {
                external_reference: id.to_string(),
                profile: cmd.profile.clone(),
            })
            .await?;

        let remote_id = remote.id;
        let customer = Customer::register(id, remote_id.clone(), cmd.profile);
        if let Err(err) = self.customers.save(&customer).await {
            return Err(consistency_gap("customer", customer.id().as_str(), &remote_id, err));
        }

        tracing::info!(customer_id = %customer.id(), remote_id = %remote_id, "Customer created");

        Ok(CreateCustomerResult { customer })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::{profile, Fixture};
    use crate::domain::billing::GatewayError;
    use crate::domain::foundation::ErrorCode;

    fn handler(fx: &Fixture) -> CreateCustomerHandler {
        CreateCustomerHandler::new(fx.customers(), fx.gateway())
    }

    #[tokio::test]
    async fn creates_customer_on_gateway_then_persists() {
        let fx = Fixture::new();

        let result = handler(&fx)
            .handle(CreateCustomerCommand { profile: profile() })
            .await
            .unwrap();

        let customer = result.customer;
        assert_eq!(customer.remote_id().unwrap().as_str(), "gw-cus-1");

        let call = &fx.gateway.calls()[0];
        assert_eq!(call.method, "create_customer");
        assert_eq!(call.args[0], customer.id().as_str());

        let stored = fx.customers().find_by_id(customer.id()).await.unwrap();
        assert_eq!(stored, Some(customer));
    }

    #[tokio::test]
    async fn invalid_profile_never_reaches_gateway() {
        let fx = Fixture::new();
        let mut bad = profile();
        bad.name = "   ".to_string();

        let err = handler(&fx)
            .handle(CreateCustomerCommand { profile: bad })
            .await
            .unwrap_err();

        assert!(err.is_validation());
        assert!(fx.gateway.calls().is_empty());
        assert_eq!(fx.store.mutation_count(), 0);
    }

    #[tokio::test]
    async fn gateway_rejection_leaves_no_local_record() {
        let fx = Fixture::new();
        fx.gateway
            .set_method_error("create_customer", GatewayError::rejected("invalid_cpfCnpj"));

        let err = handler(&fx)
            .handle(CreateCustomerCommand { profile: profile() })
            .await
            .unwrap_err();

        assert!(matches!(err, BillingError::Gateway(_)));
        assert_eq!(fx.store.mutation_count(), 0);
    }

    #[tokio::test]
    async fn persist_failure_after_remote_create_is_a_consistency_gap() {
        let fx = Fixture::new();
        fx.store.fail_next_save("customer");

        let err = handler(&fx)
            .handle(CreateCustomerCommand { profile: profile() })
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::ConsistencyGap);
        assert!(fx.gateway.was_called("create_customer"));
    }
}
