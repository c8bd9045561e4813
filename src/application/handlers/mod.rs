//! Application handlers.
//!
//! Command and query handlers that orchestrate the billing domain over the
//! gateway and store ports.

pub mod billing;
pub mod webhook;

#[cfg(test)]
pub(crate) mod test_support;

pub use billing::{
    CancelSubscriptionCommand, CancelSubscriptionHandler, CancelSubscriptionResult,
    CreateChargeCommand, CreateChargeHandler, CreateChargeResult, CreateCustomerCommand,
    CreateCustomerHandler, CreateCustomerResult, CreateInvoiceCommand, CreateInvoiceHandler,
    CreateInvoiceResult, CreateSubscriptionCommand, CreateSubscriptionHandler,
    CreateSubscriptionResult, GetChargeHandler, GetChargeQuery, GetCustomerHandler,
    GetCustomerQuery, GetInvoiceHandler, GetInvoiceQuery, GetSubscriptionHandler,
    GetSubscriptionQuery,
};
pub use webhook::{
    ChargeSync, HandleGatewayWebhookCommand, HandleGatewayWebhookHandler, InvoiceIssuer,
    IssueOutcome, MaterializeOutcome, OrphanChargeMaterializer, StatusSynchronizer, SyncOutcome,
    WebhookOutcome,
};
