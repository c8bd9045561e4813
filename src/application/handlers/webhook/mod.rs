//! Webhook handlers.
//!
//! Inbound gateway notifications are classified, then either mirrored onto
//! the matching local record or, for charges the gateway generated itself,
//! materialized. Collectable charge events issue the fiscal invoice.

mod handle_gateway_webhook;
mod issue_invoice;
mod materialize_charge;
mod sync_status;

pub use handle_gateway_webhook::{
    HandleGatewayWebhookCommand, HandleGatewayWebhookHandler, WebhookOutcome,
};
pub use issue_invoice::{InvoiceIssuer, IssueOutcome};
pub use materialize_charge::{MaterializeOutcome, OrphanChargeMaterializer};
pub use sync_status::{ChargeSync, StatusSynchronizer, SyncOutcome};
