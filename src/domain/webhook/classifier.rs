//! Webhook classification: event string and payload to a processing route.

use crate::domain::billing::BillingError;

use super::event::{ChargeEvent, GatewayEvent, InvoiceEvent, SubscriptionEvent};
use super::notification::{ChargeNotice, InvoiceNotice, SubscriptionNotice, WebhookNotification};

/// Where a notification goes next.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookRoute {
    /// Charge created by the gateway for a subscription billing cycle.
    MaterializeCharge(ChargeNotice),

    /// Creation notice with nothing to do.
    Acknowledge(GatewayEvent),

    SyncCharge {
        event: ChargeEvent,
        notice: ChargeNotice,
    },

    SyncSubscription {
        event: SubscriptionEvent,
        notice: SubscriptionNotice,
    },

    SyncInvoice {
        event: InvoiceEvent,
        notice: InvoiceNotice,
    },
}

/// Classifies a notification.
///
/// # Errors
///
/// - `UnsupportedEvent` when the event string is not declared
/// - `MalformedPayload` when the sub-object the event requires is absent
pub fn classify(notification: WebhookNotification) -> Result<WebhookRoute, BillingError> {
    let event = GatewayEvent::parse(&notification.event)?;

    let route = match event {
        GatewayEvent::Charge(ChargeEvent::Created) => {
            let notice = require(notification.payment, "payment", event)?;
            if notice.subscription_reference().is_some() {
                WebhookRoute::MaterializeCharge(notice)
            } else {
                WebhookRoute::Acknowledge(event)
            }
        }
        GatewayEvent::Charge(charge_event) => WebhookRoute::SyncCharge {
            event: charge_event,
            notice: require(notification.payment, "payment", event)?,
        },
        GatewayEvent::Subscription(SubscriptionEvent::Created) => {
            require(notification.subscription, "subscription", event)?;
            WebhookRoute::Acknowledge(event)
        }
        GatewayEvent::Subscription(sub_event) => WebhookRoute::SyncSubscription {
            event: sub_event,
            notice: require(notification.subscription, "subscription", event)?,
        },
        GatewayEvent::Invoice(InvoiceEvent::Created) => {
            require(notification.invoice, "invoice", event)?;
            WebhookRoute::Acknowledge(event)
        }
        GatewayEvent::Invoice(invoice_event) => WebhookRoute::SyncInvoice {
            event: invoice_event,
            notice: require(notification.invoice, "invoice", event)?,
        },
    };

    Ok(route)
}

fn require<T>(part: Option<T>, name: &str, event: GatewayEvent) -> Result<T, BillingError> {
    part.ok_or_else(|| {
        BillingError::malformed(format!("{} event without '{}' object", event, name))
    })
}
