//! Ports - interfaces between the application core and the outside world.
//!
//! - `PaymentGateway` - the remote payment gateway
//! - `CustomerRepository`, `ChargeRepository`, `SubscriptionRepository`,
//!   `InvoiceRepository` - the local system of record

mod charge_repository;
mod customer_repository;
mod invoice_repository;
mod payment_gateway;
mod subscription_repository;

pub use charge_repository::ChargeRepository;
pub use customer_repository::CustomerRepository;
pub use invoice_repository::InvoiceRepository;
pub use payment_gateway::{
    GatewayCharge, GatewayCustomer, GatewayError, GatewayErrorCode, GatewayInvoice,
    GatewaySubscription, NewCharge, NewCustomer, NewInvoice, NewSubscription, PaymentGateway,
};
pub use subscription_repository::SubscriptionRepository;
