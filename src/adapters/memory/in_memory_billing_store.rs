//! In-memory billing store.
//!
//! Implements all four repository ports over shared maps. Useful for:
//! - Unit and integration tests (mutation counting, save failure injection)
//! - Local development without PostgreSQL
//!
//! Enforces the same uniqueness rules as the PostgreSQL schema, including
//! one invoice per charge. Does not persist data across restarts.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::billing::{Charge, Customer, GatewayStatus, Invoice, Subscription};
use crate::domain::foundation::{
    ChargeId, CustomerId, DomainError, ErrorCode, GatewayId, InvoiceId, SubscriptionId,
};
use crate::ports::{ChargeRepository, CustomerRepository, InvoiceRepository, SubscriptionRepository};

/// In-memory implementation of the repository ports.
#[derive(Default)]
pub struct InMemoryBillingStore {
    customers: RwLock<HashMap<CustomerId, Customer>>,
    charges: RwLock<HashMap<ChargeId, Charge>>,
    subscriptions: RwLock<HashMap<SubscriptionId, Subscription>>,
    invoices: RwLock<HashMap<InvoiceId, Invoice>>,
    mutations: AtomicUsize,
    failing_saves: Mutex<HashSet<&'static str>>,
}

impl InMemoryBillingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful writes (saves and status updates) so far.
    pub fn mutation_count(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    /// Makes the next save of `entity` ("customer", "charge", "subscription"
    /// or "invoice") fail with a database error.
    pub fn fail_next_save(&self, entity: &'static str) {
        self.failing_saves
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(entity);
    }

    pub async fn charges(&self) -> Vec<Charge> {
        self.charges.read().await.values().cloned().collect()
    }

    pub async fn invoices(&self) -> Vec<Invoice> {
        self.invoices.read().await.values().cloned().collect()
    }

    /// Number of invoices recorded for `charge_id`.
    pub async fn invoice_count_for(&self, charge_id: &ChargeId) -> usize {
        self.invoices
            .read()
            .await
            .values()
            .filter(|i| &i.charge_id == charge_id)
            .count()
    }

    fn check_injected_failure(&self, entity: &'static str) -> Result<(), DomainError> {
        let mut failing = self
            .failing_saves
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if failing.remove(entity) {
            return Err(DomainError::new(
                ErrorCode::DatabaseError,
                format!("Injected failure saving {}", entity),
            ));
        }
        Ok(())
    }

    fn record_mutation(&self) {
        self.mutations.fetch_add(1, Ordering::SeqCst);
    }
}

fn duplicate(entity: &str, id: impl std::fmt::Display) -> DomainError {
    DomainError::new(
        ErrorCode::ValidationFailed,
        format!("{} {} already exists", entity, id),
    )
    .with_detail("field", "id")
}

#[async_trait]
impl CustomerRepository for InMemoryBillingStore {
    async fn save(&self, customer: &Customer) -> Result<(), DomainError> {
        self.check_injected_failure("customer")?;
        let mut customers = self.customers.write().await;
        if customers.contains_key(customer.id()) {
            return Err(duplicate("Customer", customer.id()));
        }
        customers.insert(customer.id().clone(), customer.clone());
        self.record_mutation();
        Ok(())
    }

    async fn find_by_id(&self, id: &CustomerId) -> Result<Option<Customer>, DomainError> {
        Ok(self.customers.read().await.get(id).cloned())
    }
}

#[async_trait]
impl ChargeRepository for InMemoryBillingStore {
    async fn save(&self, charge: &Charge) -> Result<(), DomainError> {
        self.check_injected_failure("charge")?;
        let mut charges = self.charges.write().await;
        if charges.contains_key(charge.id()) {
            return Err(duplicate("Charge", charge.id()));
        }
        if let Some(remote) = charge.remote_id() {
            if charges.values().any(|c| c.remote_id() == Some(remote)) {
                return Err(duplicate("Charge with gateway id", remote));
            }
        }
        charges.insert(charge.id().clone(), charge.clone());
        self.record_mutation();
        Ok(())
    }

    async fn find_by_id(&self, id: &ChargeId) -> Result<Option<Charge>, DomainError> {
        Ok(self.charges.read().await.get(id).cloned())
    }

    async fn find_by_external_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Charge>, DomainError> {
        Ok(self
            .charges
            .read()
            .await
            .values()
            .find(|c| c.id().as_str() == reference)
            .cloned())
    }

    async fn find_by_remote_id(
        &self,
        remote_id: &GatewayId,
    ) -> Result<Option<Charge>, DomainError> {
        Ok(self
            .charges
            .read()
            .await
            .values()
            .find(|c| c.remote_id() == Some(remote_id))
            .cloned())
    }

    async fn update_status(
        &self,
        id: &ChargeId,
        status: &GatewayStatus,
        invoice_url: Option<&str>,
        receipt_url: Option<&str>,
    ) -> Result<(), DomainError> {
        let mut charges = self.charges.write().await;
        let charge = charges.get_mut(id).ok_or_else(|| {
            DomainError::new(ErrorCode::ChargeNotFound, format!("Charge {} not found", id))
        })?;
        charge.apply_status(
            status.clone(),
            invoice_url.map(String::from),
            receipt_url.map(String::from),
        );
        self.record_mutation();
        Ok(())
    }
}

#[async_trait]
impl SubscriptionRepository for InMemoryBillingStore {
    async fn save(&self, subscription: &Subscription) -> Result<(), DomainError> {
        self.check_injected_failure("subscription")?;
        let mut subscriptions = self.subscriptions.write().await;
        if subscriptions.contains_key(subscription.id()) {
            return Err(duplicate("Subscription", subscription.id()));
        }
        subscriptions.insert(subscription.id().clone(), subscription.clone());
        self.record_mutation();
        Ok(())
    }

    async fn find_by_id(&self, id: &SubscriptionId) -> Result<Option<Subscription>, DomainError> {
        Ok(self.subscriptions.read().await.get(id).cloned())
    }

    async fn find_by_external_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Subscription>, DomainError> {
        Ok(self
            .subscriptions
            .read()
            .await
            .values()
            .find(|s| s.id().as_str() == reference)
            .cloned())
    }

    async fn update_status(
        &self,
        id: &SubscriptionId,
        status: &GatewayStatus,
    ) -> Result<(), DomainError> {
        let mut subscriptions = self.subscriptions.write().await;
        let subscription = subscriptions.get_mut(id).ok_or_else(|| {
            DomainError::new(
                ErrorCode::SubscriptionNotFound,
                format!("Subscription {} not found", id),
            )
        })?;
        subscription.apply_status(status.clone());
        self.record_mutation();
        Ok(())
    }
}

#[async_trait]
impl InvoiceRepository for InMemoryBillingStore {
    async fn save(&self, invoice: &Invoice) -> Result<(), DomainError> {
        self.check_injected_failure("invoice")?;
        let mut invoices = self.invoices.write().await;
        if invoices.values().any(|i| i.charge_id == invoice.charge_id) {
            return Err(DomainError::new(
                ErrorCode::InvoiceAlreadyIssued,
                format!("Charge {} already has an invoice", invoice.charge_id),
            )
            .with_detail("charge_id", invoice.charge_id.as_str()));
        }
        if invoices.contains_key(invoice.id()) {
            return Err(duplicate("Invoice", invoice.id()));
        }
        if invoices
            .values()
            .any(|i| i.external_reference == invoice.external_reference)
        {
            return Err(DomainError::new(
                ErrorCode::ValidationFailed,
                format!(
                    "Invoice reference {} is already in use",
                    invoice.external_reference
                ),
            )
            .with_detail("field", "external_reference"));
        }
        invoices.insert(invoice.id().clone(), invoice.clone());
        self.record_mutation();
        Ok(())
    }

    async fn find_by_id(&self, id: &InvoiceId) -> Result<Option<Invoice>, DomainError> {
        Ok(self.invoices.read().await.get(id).cloned())
    }

    async fn find_by_charge_id(&self, charge_id: &ChargeId) -> Result<Option<Invoice>, DomainError> {
        Ok(self
            .invoices
            .read()
            .await
            .values()
            .find(|i| &i.charge_id == charge_id)
            .cloned())
    }

    async fn find_by_external_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Invoice>, DomainError> {
        Ok(self
            .invoices
            .read()
            .await
            .values()
            .find(|i| i.external_reference == reference)
            .cloned())
    }

    async fn update_status(
        &self,
        id: &InvoiceId,
        status: &GatewayStatus,
    ) -> Result<(), DomainError> {
        let mut invoices = self.invoices.write().await;
        let invoice = invoices.get_mut(id).ok_or_else(|| {
            DomainError::new(ErrorCode::InvoiceNotFound, format!("Invoice {} not found", id))
        })?;
        invoice.apply_status(status.clone());
        self.record_mutation();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::{
        BillingType, ChargeTerms, InvoiceDefaults, RemoteChargeState,
    };
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn charge(id: &str, remote: &str) -> Charge {
        Charge::register(
            ChargeId::new(id).unwrap(),
            CustomerId::new("cust-1").unwrap(),
            ChargeTerms {
                billing_type: BillingType::Boleto,
                value: Decimal::new(15000, 2),
                due_date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
                description: None,
                installment_count: None,
                callback: None,
            },
            RemoteChargeState {
                remote_id: GatewayId::new(remote).unwrap(),
                status: GatewayStatus::new("PENDING"),
                invoice_url: None,
                receipt_url: None,
            },
        )
    }

    fn invoice_for(charge: &Charge, remote: &str) -> Invoice {
        let details = InvoiceDefaults::default()
            .details_for(charge, NaiveDate::from_ymd_opt(2025, 1, 12).unwrap());
        Invoice::register(
            InvoiceId::generate(),
            charge.id().clone(),
            charge.id().to_string(),
            details,
            GatewayId::new(remote).unwrap(),
            GatewayStatus::new("SCHEDULED"),
            None,
        )
    }

    #[tokio::test]
    async fn charge_lookup_by_reference_and_remote_id() {
        let store = InMemoryBillingStore::new();
        ChargeRepository::save(&store, &charge("ch-1", "gw-pay-1")).await.unwrap();

        let by_ref = ChargeRepository::find_by_external_reference(&store, "ch-1")
            .await
            .unwrap();
        assert_eq!(by_ref.unwrap().remote_id().unwrap().as_str(), "gw-pay-1");

        let by_remote = store
            .find_by_remote_id(&GatewayId::new("gw-pay-1").unwrap())
            .await
            .unwrap();
        assert_eq!(by_remote.unwrap().id().as_str(), "ch-1");
    }

    #[tokio::test]
    async fn second_invoice_for_same_charge_is_rejected() {
        let store = InMemoryBillingStore::new();
        let c = charge("ch-1", "gw-pay-1");

        InvoiceRepository::save(&store, &invoice_for(&c, "inv_1")).await.unwrap();
        let err = InvoiceRepository::save(&store, &invoice_for(&c, "inv_2"))
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::InvoiceAlreadyIssued);
        assert_eq!(err.details.get("charge_id"), Some(&"ch-1".to_string()));
        assert_eq!(store.invoice_count_for(c.id()).await, 1);
    }

    #[tokio::test]
    async fn invoice_reference_is_unique_across_charges() {
        let store = InMemoryBillingStore::new();
        let first = charge("ch-1", "gw-pay-1");
        let second = charge("ch-2", "gw-pay-2");
        InvoiceRepository::save(&store, &invoice_for(&first, "inv_1")).await.unwrap();

        let mut clash = invoice_for(&second, "inv_2");
        clash.external_reference = "ch-1".to_string();
        let err = InvoiceRepository::save(&store, &clash).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert_eq!(
            err.details.get("field"),
            Some(&"external_reference".to_string())
        );
        assert_eq!(store.invoice_count_for(second.id()).await, 0);
    }

    #[tokio::test]
    async fn update_status_of_missing_charge_fails() {
        let store = InMemoryBillingStore::new();
        let err = ChargeRepository::update_status(
            &store,
            &ChargeId::new("nope").unwrap(),
            &GatewayStatus::new("RECEIVED"),
            None,
            None,
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ChargeNotFound);
        assert_eq!(store.mutation_count(), 0);
    }

    #[tokio::test]
    async fn injected_failure_applies_once() {
        let store = InMemoryBillingStore::new();
        store.fail_next_save("charge");

        let err = ChargeRepository::save(&store, &charge("ch-1", "gw-pay-1"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);

        ChargeRepository::save(&store, &charge("ch-1", "gw-pay-1")).await.unwrap();
        assert_eq!(store.mutation_count(), 1);
    }

    #[tokio::test]
    async fn gateway_id_is_unique_across_charges() {
        let store = InMemoryBillingStore::new();
        ChargeRepository::save(&store, &charge("ch-1", "gw-pay-1")).await.unwrap();
        assert!(ChargeRepository::save(&store, &charge("ch-2", "gw-pay-1"))
            .await
            .is_err());
    }
}
