//! Billing handlers.
//!
//! ## Commands
//! - Creating customers, charges, subscriptions and invoices through the
//!   dual-write protocol: validate, check parents, generate a local id,
//!   resolve the parent's gateway id, create remotely, persist locally
//! - Cancelling subscriptions
//!
//! ## Queries
//! - Reading any of the four records from the local store

mod cancel_subscription;
mod create_charge;
mod create_customer;
mod create_invoice;
mod create_subscription;
mod get_charge;
mod get_customer;
mod get_invoice;
mod get_subscription;

use crate::domain::billing::BillingError;
use crate::domain::foundation::{DomainError, GatewayId};

// Commands
pub use cancel_subscription::{
    CancelSubscriptionCommand, CancelSubscriptionHandler, CancelSubscriptionResult,
};
pub use create_charge::{CreateChargeCommand, CreateChargeHandler, CreateChargeResult};
pub use create_customer::{CreateCustomerCommand, CreateCustomerHandler, CreateCustomerResult};
pub use create_invoice::{CreateInvoiceCommand, CreateInvoiceHandler, CreateInvoiceResult};
pub use create_subscription::{
    CreateSubscriptionCommand, CreateSubscriptionHandler, CreateSubscriptionResult,
};

// Queries
pub use get_charge::{GetChargeHandler, GetChargeQuery};
pub use get_customer::{GetCustomerHandler, GetCustomerQuery};
pub use get_invoice::{GetInvoiceHandler, GetInvoiceQuery};
pub use get_subscription::{GetSubscriptionHandler, GetSubscriptionQuery};

/// A local write failed after the gateway accepted the paired mutation.
///
/// Nothing repairs the gap automatically; the error log is the record.
pub(crate) fn consistency_gap(
    entity: &'static str,
    local_id: &str,
    remote_id: &GatewayId,
    err: DomainError,
) -> BillingError {
    tracing::error!(
        entity,
        local_id,
        remote_id = %remote_id,
        error = %err,
        "Gateway write succeeded but local persist failed"
    );
    BillingError::consistency_gap(entity, local_id, remote_id, err)
}
