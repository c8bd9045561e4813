//! Shared fixtures for handler tests: an in-memory store and a mock gateway
//! wired together, plus builders for the records most tests start from.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::adapters::asaas::MockPaymentGateway;
use crate::adapters::memory::InMemoryBillingStore;
use crate::domain::billing::{
    BillingType, Charge, ChargeTerms, Customer, CustomerProfile, Cycle, GatewayStatus, Invoice,
    InvoiceDefaults, Subscription, SubscriptionPlan,
};
use crate::domain::foundation::{
    ChargeId, CustomerId, DomainError, GatewayId, InvoiceId, SubscriptionId,
};
use crate::ports::{
    ChargeRepository, CustomerRepository, GatewayCustomer, GatewaySubscription, InvoiceRepository,
    PaymentGateway, SubscriptionRepository,
};

pub(crate) struct Fixture {
    pub store: Arc<InMemoryBillingStore>,
    pub gateway: Arc<MockPaymentGateway>,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            store: Arc::new(InMemoryBillingStore::new()),
            gateway: Arc::new(MockPaymentGateway::new()),
        }
    }

    pub fn customers(&self) -> Arc<dyn CustomerRepository> {
        self.store.clone()
    }

    pub fn charges(&self) -> Arc<dyn ChargeRepository> {
        self.store.clone()
    }

    pub fn subscriptions(&self) -> Arc<dyn SubscriptionRepository> {
        self.store.clone()
    }

    pub fn invoices(&self) -> Arc<dyn InvoiceRepository> {
        self.store.clone()
    }

    pub fn gateway(&self) -> Arc<dyn PaymentGateway> {
        self.gateway.clone()
    }

    /// Customer known on both sides, as if created through the handler.
    pub async fn seed_customer(&self, local: &str) -> Customer {
        let remote = GatewayId::new(format!("gw-{}", local)).unwrap();
        self.gateway.add_customer(GatewayCustomer {
            id: remote.clone(),
            external_reference: Some(local.to_string()),
        });
        let customer = Customer::register(CustomerId::new(local).unwrap(), remote, profile());
        self.customers().save(&customer).await.unwrap();
        customer
    }

    /// Subscription known on both sides.
    pub async fn seed_subscription(&self, local: &str, remote: &str, customer: &str) -> Subscription {
        self.gateway.add_subscription(GatewaySubscription {
            id: GatewayId::new(remote).unwrap(),
            customer: Some(format!("gw-{}", customer)),
            status: GatewayStatus::new("ACTIVE"),
            external_reference: Some(local.to_string()),
        });
        let subscription = Subscription::register(
            SubscriptionId::new(local).unwrap(),
            CustomerId::new(customer).unwrap(),
            plan(),
            GatewayId::new(remote).unwrap(),
            GatewayStatus::new("ACTIVE"),
        );
        self.subscriptions().save(&subscription).await.unwrap();
        subscription
    }
}

pub(crate) fn profile() -> CustomerProfile {
    CustomerProfile {
        name: "Maria Souza".to_string(),
        email: Some("maria@example.com".to_string()),
        cpf_cnpj: "24971563792".to_string(),
        ..CustomerProfile::default()
    }
}

pub(crate) fn boleto_terms() -> ChargeTerms {
    ChargeTerms {
        billing_type: BillingType::Boleto,
        value: Decimal::new(15000, 2),
        due_date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
        description: None,
        installment_count: None,
        callback: None,
    }
}

pub(crate) fn plan() -> SubscriptionPlan {
    SubscriptionPlan {
        billing_type: BillingType::Pix,
        value: Decimal::new(4990, 2),
        cycle: Cycle::Monthly,
        next_due_date: NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
        description: Some("Pro plan".to_string()),
        end_date: None,
        max_payments: None,
    }
}

/// Invoice store where a concurrent writer commits `rival` mid-flow.
///
/// The rival lands after `lookups_before_commit` charge-id lookups have been
/// answered, or just before our own `save` if that comes first.
pub(crate) struct RacingInvoices {
    inner: Arc<InMemoryBillingStore>,
    rival: Mutex<Option<Invoice>>,
    lookups_before_commit: usize,
    lookups: AtomicUsize,
}

impl RacingInvoices {
    pub fn new(inner: Arc<InMemoryBillingStore>, rival: Invoice, lookups_before_commit: usize) -> Self {
        Self {
            inner,
            rival: Mutex::new(Some(rival)),
            lookups_before_commit,
            lookups: AtomicUsize::new(0),
        }
    }

    async fn commit_rival(&self) {
        let rival = self.rival.lock().unwrap().take();
        if let Some(rival) = rival {
            InvoiceRepository::save(self.inner.as_ref(), &rival).await.unwrap();
        }
    }
}

#[async_trait]
impl InvoiceRepository for RacingInvoices {
    async fn save(&self, invoice: &Invoice) -> Result<(), DomainError> {
        self.commit_rival().await;
        InvoiceRepository::save(self.inner.as_ref(), invoice).await
    }

    async fn find_by_id(&self, id: &InvoiceId) -> Result<Option<Invoice>, DomainError> {
        InvoiceRepository::find_by_id(self.inner.as_ref(), id).await
    }

    async fn find_by_charge_id(&self, charge_id: &ChargeId) -> Result<Option<Invoice>, DomainError> {
        if self.lookups.fetch_add(1, Ordering::SeqCst) >= self.lookups_before_commit {
            self.commit_rival().await;
        }
        InvoiceRepository::find_by_charge_id(self.inner.as_ref(), charge_id).await
    }

    async fn find_by_external_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Invoice>, DomainError> {
        InvoiceRepository::find_by_external_reference(self.inner.as_ref(), reference).await
    }

    async fn update_status(&self, id: &InvoiceId, status: &GatewayStatus) -> Result<(), DomainError> {
        InvoiceRepository::update_status(self.inner.as_ref(), id, status).await
    }
}

/// Invoice another worker already issued for `charge`, under `remote`.
pub(crate) fn rival_invoice(charge: &Charge, remote: &str) -> Invoice {
    Invoice::register(
        InvoiceId::generate(),
        charge.id().clone(),
        charge.id().to_string(),
        InvoiceDefaults::default().details_for(charge, NaiveDate::from_ymd_opt(2025, 1, 12).unwrap()),
        GatewayId::new(remote).unwrap(),
        GatewayStatus::new("SCHEDULED"),
        None,
    )
}
