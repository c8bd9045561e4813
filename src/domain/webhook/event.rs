//! Gateway event types.
//!
//! The set is closed: every event string the gateway is known to send has a
//! variant, and anything else fails parsing. A new string from the gateway
//! means the contract drifted and must be looked at, not skipped.

use std::fmt;

use crate::domain::billing::BillingError;

/// Declares one family of gateway events with its wire spelling.
macro_rules! event_family {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every member of the family.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }

            fn from_wire(s: &str) -> Option<Self> {
                match s {
                    $($wire => Some($name::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

event_family!(
    /// Events carrying a `payment` object.
    ChargeEvent {
        Created => "PAYMENT_CREATED",
        Authorized => "PAYMENT_AUTHORIZED",
        AwaitingRiskAnalysis => "PAYMENT_AWAITING_RISK_ANALYSIS",
        ApprovedByRiskAnalysis => "PAYMENT_APPROVED_BY_RISK_ANALYSIS",
        ReprovedByRiskAnalysis => "PAYMENT_REPROVED_BY_RISK_ANALYSIS",
        Updated => "PAYMENT_UPDATED",
        Confirmed => "PAYMENT_CONFIRMED",
        Received => "PAYMENT_RECEIVED",
        CreditCardCaptureRefused => "PAYMENT_CREDIT_CARD_CAPTURE_REFUSED",
        Anticipated => "PAYMENT_ANTICIPATED",
        Overdue => "PAYMENT_OVERDUE",
        Deleted => "PAYMENT_DELETED",
        Restored => "PAYMENT_RESTORED",
        Refunded => "PAYMENT_REFUNDED",
        PartiallyRefunded => "PAYMENT_PARTIALLY_REFUNDED",
        RefundInProgress => "PAYMENT_REFUND_IN_PROGRESS",
        ReceivedInCashUndone => "PAYMENT_RECEIVED_IN_CASH_UNDONE",
        ChargebackRequested => "PAYMENT_CHARGEBACK_REQUESTED",
        ChargebackDispute => "PAYMENT_CHARGEBACK_DISPUTE",
        AwaitingChargebackReversal => "PAYMENT_AWAITING_CHARGEBACK_REVERSAL",
        DunningReceived => "PAYMENT_DUNNING_RECEIVED",
        DunningRequested => "PAYMENT_DUNNING_REQUESTED",
        BankSlipViewed => "PAYMENT_BANK_SLIP_VIEWED",
        CheckoutViewed => "PAYMENT_CHECKOUT_VIEWED",
        SplitCancelled => "PAYMENT_SPLIT_CANCELLED",
        SplitDivergenceBlock => "PAYMENT_SPLIT_DIVERGENCE_BLOCK",
        SplitDivergenceBlockFinished => "PAYMENT_SPLIT_DIVERGENCE_BLOCK_FINISHED",
    }
);

event_family!(
    /// Events carrying a `subscription` object.
    SubscriptionEvent {
        Created => "SUBSCRIPTION_CREATED",
        Updated => "SUBSCRIPTION_UPDATED",
        Inactivated => "SUBSCRIPTION_INACTIVATED",
        Deleted => "SUBSCRIPTION_DELETED",
        SplitDisabled => "SUBSCRIPTION_SPLIT_DISABLED",
        SplitDivergenceBlock => "SUBSCRIPTION_SPLIT_DIVERGENCE_BLOCK",
        SplitDivergenceBlockFinished => "SUBSCRIPTION_SPLIT_DIVERGENCE_BLOCK_FINISHED",
    }
);

event_family!(
    /// Events carrying an `invoice` object.
    InvoiceEvent {
        Created => "INVOICE_CREATED",
        Updated => "INVOICE_UPDATED",
        Synchronized => "INVOICE_SYNCHRONIZED",
        Authorized => "INVOICE_AUTHORIZED",
        ProcessingCancellation => "INVOICE_PROCESSING_CANCELLATION",
        Canceled => "INVOICE_CANCELED",
        CancellationDenied => "INVOICE_CANCELLATION_DENIED",
        Error => "INVOICE_ERROR",
    }
);

impl ChargeEvent {
    /// Charge reached a state in which it is collectable and must be invoiced.
    pub fn triggers_invoice(&self) -> bool {
        matches!(
            self,
            ChargeEvent::Confirmed
                | ChargeEvent::Received
                | ChargeEvent::Overdue
                | ChargeEvent::Anticipated
                | ChargeEvent::DunningReceived
        )
    }
}

/// Any event the gateway may deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayEvent {
    Charge(ChargeEvent),
    Subscription(SubscriptionEvent),
    Invoice(InvoiceEvent),
}

impl GatewayEvent {
    /// Parses the `event` field of a notification.
    ///
    /// # Errors
    ///
    /// `UnsupportedEvent` for any string outside the declared set.
    pub fn parse(s: &str) -> Result<Self, BillingError> {
        ChargeEvent::from_wire(s)
            .map(GatewayEvent::Charge)
            .or_else(|| SubscriptionEvent::from_wire(s).map(GatewayEvent::Subscription))
            .or_else(|| InvoiceEvent::from_wire(s).map(GatewayEvent::Invoice))
            .ok_or_else(|| BillingError::UnsupportedEvent(s.to_string()))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GatewayEvent::Charge(e) => e.as_str(),
            GatewayEvent::Subscription(e) => e.as_str(),
            GatewayEvent::Invoice(e) => e.as_str(),
        }
    }

    /// Every supported event.
    pub fn all() -> impl Iterator<Item = GatewayEvent> {
        ChargeEvent::ALL
            .iter()
            .copied()
            .map(GatewayEvent::Charge)
            .chain(SubscriptionEvent::ALL.iter().copied().map(GatewayEvent::Subscription))
            .chain(InvoiceEvent::ALL.iter().copied().map(GatewayEvent::Invoice))
    }
}

impl fmt::Display for GatewayEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
