//! Gateway webhook vocabulary and classification.

mod classifier;
mod event;
mod notification;

pub use classifier::{classify, WebhookRoute};
pub use event::{ChargeEvent, GatewayEvent, InvoiceEvent, SubscriptionEvent};
pub use notification::{ChargeNotice, InvoiceNotice, SubscriptionNotice, WebhookNotification};
