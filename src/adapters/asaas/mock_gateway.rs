//! Mock payment gateway for testing.
//!
//! Behaves like a tiny stateful gateway: created objects are stored and can be
//! found again by external reference or id. Supports:
//! - Seeding gateway-side objects (subscriptions, autonomously created charges)
//! - Error injection, per method or one-shot
//! - Call tracking

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::domain::billing::GatewayStatus;
use crate::domain::foundation::GatewayId;
use crate::ports::{
    GatewayCharge, GatewayCustomer, GatewayError, GatewayInvoice, GatewaySubscription, NewCharge,
    NewCustomer, NewInvoice, NewSubscription, PaymentGateway,
};

/// Mock gateway for testing.
///
/// # Example
///
/// ```ignore
/// let gateway = MockPaymentGateway::new();
/// gateway.set_method_error("create_charge", GatewayError::timeout("no answer"));
///
/// let result = gateway.create_charge(&request).await;
/// assert!(result.is_err());
/// assert_eq!(gateway.call_count("create_charge"), 1);
/// ```
#[derive(Default)]
pub struct MockPaymentGateway {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    sequence: u64,
    customers: HashMap<String, GatewayCustomer>,
    charges: HashMap<String, GatewayCharge>,
    subscriptions: HashMap<String, GatewaySubscription>,
    invoices: HashMap<String, GatewayInvoice>,
    /// Status given to newly created charges.
    charge_status: Option<String>,
    next_error: Option<GatewayError>,
    method_errors: HashMap<String, GatewayError>,
    call_log: Vec<MethodCall>,
}

/// Recorded method call for assertions.
#[derive(Debug, Clone)]
pub struct MethodCall {
    pub method: String,
    pub args: Vec<String>,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Methods
    // ════════════════════════════════════════════════════════════════════════════

    /// Status returned for charges created from now on (default `PENDING`).
    pub fn set_charge_status(&self, status: &str) {
        self.state().charge_status = Some(status.to_string());
    }

    /// Add a customer to the gateway side.
    pub fn add_customer(&self, customer: GatewayCustomer) {
        self.state()
            .customers
            .insert(customer.id.to_string(), customer);
    }

    /// Add a subscription to the gateway side.
    pub fn add_subscription(&self, subscription: GatewaySubscription) {
        self.state()
            .subscriptions
            .insert(subscription.id.to_string(), subscription);
    }

    /// Add a charge to the gateway side, as if the gateway created it itself.
    pub fn add_charge(&self, charge: GatewayCharge) {
        self.state().charges.insert(charge.id.to_string(), charge);
    }

    /// Set an error to return on the next call to any method.
    pub fn set_error(&self, error: GatewayError) {
        self.state().next_error = Some(error);
    }

    /// Set an error for a specific method until cleared.
    pub fn set_method_error(&self, method: &str, error: GatewayError) {
        self.state().method_errors.insert(method.to_string(), error);
    }

    pub fn clear_errors(&self) {
        let mut state = self.state();
        state.next_error = None;
        state.method_errors.clear();
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Inspection
    // ════════════════════════════════════════════════════════════════════════════

    /// Gateway-side view of a charge.
    pub fn charge(&self, id: &str) -> Option<GatewayCharge> {
        self.state().charges.get(id).cloned()
    }

    pub fn invoice_count(&self) -> usize {
        self.state().invoices.len()
    }

    pub fn calls(&self) -> Vec<MethodCall> {
        self.state().call_log.clone()
    }

    pub fn was_called(&self, method: &str) -> bool {
        self.state().call_log.iter().any(|c| c.method == method)
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.state()
            .call_log
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    /// Number of calls that would change gateway state.
    pub fn mutating_call_count(&self) -> usize {
        self.state()
            .call_log
            .iter()
            .filter(|c| {
                c.method.starts_with("create_")
                    || c.method.starts_with("update_")
                    || c.method.starts_with("cancel_")
            })
            .count()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Internal Helpers
    // ════════════════════════════════════════════════════════════════════════════

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self, method: &str, args: Vec<String>) -> Result<(), GatewayError> {
        let mut state = self.state();
        state.call_log.push(MethodCall {
            method: method.to_string(),
            args,
        });

        if let Some(error) = state.method_errors.get(method) {
            return Err(error.clone());
        }
        if let Some(error) = state.next_error.take() {
            return Err(error);
        }
        Ok(())
    }
}

impl MockState {
    fn next_id(&mut self, prefix: &str) -> Result<GatewayId, GatewayError> {
        self.sequence += 1;
        GatewayId::new(format!("{}-{}", prefix, self.sequence))
            .map_err(|e| GatewayError::invalid_response(e.to_string()))
    }
}

impl Clone for MockPaymentGateway {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

fn with_reference<'a, T>(
    mut items: impl Iterator<Item = &'a T>,
    reference: &str,
    get: impl Fn(&T) -> Option<&String>,
) -> Option<T>
where
    T: Clone + 'a,
{
    items
        .find(|item| get(item).map(String::as_str) == Some(reference))
        .cloned()
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_customer(
        &self,
        request: &NewCustomer,
    ) -> Result<GatewayCustomer, GatewayError> {
        self.begin(
            "create_customer",
            vec![request.external_reference.clone(), request.profile.name.clone()],
        )?;

        let mut state = self.state();
        let customer = GatewayCustomer {
            id: state.next_id("gw-cus")?,
            external_reference: Some(request.external_reference.clone()),
        };
        state
            .customers
            .insert(customer.id.to_string(), customer.clone());
        Ok(customer)
    }

    async fn find_customer_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<GatewayCustomer>, GatewayError> {
        self.begin("find_customer_by_reference", vec![reference.to_string()])?;
        let state = self.state();
        Ok(with_reference(state.customers.values(), reference, |c| {
            c.external_reference.as_ref()
        }))
    }

    async fn create_charge(&self, request: &NewCharge) -> Result<GatewayCharge, GatewayError> {
        self.begin(
            "create_charge",
            vec![
                request.customer.to_string(),
                request.external_reference.clone(),
                request.terms.value.to_string(),
            ],
        )?;

        let mut state = self.state();
        let id = state.next_id("gw-pay")?;
        let status = state
            .charge_status
            .clone()
            .unwrap_or_else(|| "PENDING".to_string());
        let charge = GatewayCharge {
            invoice_url: Some(format!("https://gateway.test/i/{}", id)),
            id,
            customer: Some(request.customer.to_string()),
            subscription: None,
            status: GatewayStatus::new(status),
            value: Some(request.terms.value),
            due_date: Some(request.terms.due_date),
            external_reference: Some(request.external_reference.clone()),
            receipt_url: None,
        };
        state.charges.insert(charge.id.to_string(), charge.clone());
        Ok(charge)
    }

    async fn find_charge_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<GatewayCharge>, GatewayError> {
        self.begin("find_charge_by_reference", vec![reference.to_string()])?;
        let state = self.state();
        Ok(with_reference(state.charges.values(), reference, |c| {
            c.external_reference.as_ref()
        }))
    }

    async fn update_charge_reference(
        &self,
        charge: &GatewayId,
        reference: &str,
    ) -> Result<(), GatewayError> {
        self.begin(
            "update_charge_reference",
            vec![charge.to_string(), reference.to_string()],
        )?;
        let mut state = self.state();
        let stored = state
            .charges
            .get_mut(charge.as_str())
            .ok_or_else(|| GatewayError::not_found("payment").with_http_status(404))?;
        stored.external_reference = Some(reference.to_string());
        Ok(())
    }

    async fn create_subscription(
        &self,
        request: &NewSubscription,
    ) -> Result<GatewaySubscription, GatewayError> {
        self.begin(
            "create_subscription",
            vec![
                request.customer.to_string(),
                request.external_reference.clone(),
                request.plan.cycle.to_string(),
            ],
        )?;

        let mut state = self.state();
        let subscription = GatewaySubscription {
            id: state.next_id("gw-sub")?,
            customer: Some(request.customer.to_string()),
            status: GatewayStatus::new("ACTIVE"),
            external_reference: Some(request.external_reference.clone()),
        };
        state
            .subscriptions
            .insert(subscription.id.to_string(), subscription.clone());
        Ok(subscription)
    }

    async fn find_subscription_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<GatewaySubscription>, GatewayError> {
        self.begin("find_subscription_by_reference", vec![reference.to_string()])?;
        let state = self.state();
        Ok(with_reference(state.subscriptions.values(), reference, |s| {
            s.external_reference.as_ref()
        }))
    }

    async fn get_subscription(
        &self,
        id: &GatewayId,
    ) -> Result<Option<GatewaySubscription>, GatewayError> {
        self.begin("get_subscription", vec![id.to_string()])?;
        Ok(self.state().subscriptions.get(id.as_str()).cloned())
    }

    async fn cancel_subscription(
        &self,
        id: &GatewayId,
    ) -> Result<GatewaySubscription, GatewayError> {
        self.begin("cancel_subscription", vec![id.to_string()])?;
        let mut state = self.state();
        let stored = state
            .subscriptions
            .get_mut(id.as_str())
            .ok_or_else(|| GatewayError::not_found("subscription").with_http_status(404))?;
        stored.status = GatewayStatus::new("INACTIVE");
        Ok(stored.clone())
    }

    async fn create_invoice(&self, request: &NewInvoice) -> Result<GatewayInvoice, GatewayError> {
        self.begin(
            "create_invoice",
            vec![
                request.charge.to_string(),
                request.external_reference.clone(),
                request.details.value.to_string(),
            ],
        )?;

        let mut state = self.state();
        let id = state.next_id("gw-inv")?;
        let invoice = GatewayInvoice {
            payment_link: Some(format!("https://gateway.test/nf/{}", id)),
            id,
            status: GatewayStatus::new("SCHEDULED"),
            external_reference: Some(request.external_reference.clone()),
        };
        state.invoices.insert(invoice.id.to_string(), invoice.clone());
        Ok(invoice)
    }

    async fn find_invoice_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<GatewayInvoice>, GatewayError> {
        self.begin("find_invoice_by_reference", vec![reference.to_string()])?;
        let state = self.state();
        Ok(with_reference(state.invoices.values(), reference, |i| {
            i.external_reference.as_ref()
        }))
    }
}
