//! Billing domain - customers, charges, subscriptions and invoices mirrored
//! between the local store and the payment gateway.

mod charge;
mod customer;
mod errors;
mod gateway_error;
mod invoice;
mod subscription;
mod values;

pub use charge::{Charge, ChargeCallback, ChargeTerms, RemoteChargeState};
pub use customer::{Customer, CustomerProfile};
pub use errors::BillingError;
pub use gateway_error::{GatewayError, GatewayErrorCode};
pub use invoice::{
    Invoice, InvoiceDefaults, InvoiceDetails, InvoiceTaxes, DEFAULT_MUNICIPAL_SERVICE_CODE,
    DEFAULT_MUNICIPAL_SERVICE_NAME, SIMPLIFIED_REGIME_NOTICE,
};
pub use subscription::{Subscription, SubscriptionPlan};
pub use values::{BillingType, Cycle, GatewayStatus};
