//! Inbound webhook body.
//!
//! Only fields this system acts on are captured; the gateway sends many more.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// `{"event": ..., "payment"?: {...}, "invoice"?: {...}, "subscription"?: {...}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookNotification {
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment: Option<ChargeNotice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice: Option<InvoiceNotice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription: Option<SubscriptionNotice>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeNotice {
    /// Gateway id of the charge.
    pub id: Option<String>,
    /// Gateway id of the customer.
    pub customer: Option<String>,
    /// Gateway id of the subscription that generated the charge.
    pub subscription: Option<String>,
    pub billing_type: Option<String>,
    pub value: Option<Decimal>,
    pub due_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub external_reference: Option<String>,
    pub invoice_url: Option<String>,
    pub transaction_receipt_url: Option<String>,
}

impl ChargeNotice {
    pub fn external_reference(&self) -> Option<&str> {
        non_blank(&self.external_reference)
    }

    pub fn subscription_reference(&self) -> Option<&str> {
        non_blank(&self.subscription)
    }

    pub fn remote_id(&self) -> Option<&str> {
        non_blank(&self.id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionNotice {
    pub id: Option<String>,
    pub customer: Option<String>,
    pub status: Option<String>,
    pub external_reference: Option<String>,
    pub value: Option<Decimal>,
    pub cycle: Option<String>,
    pub next_due_date: Option<NaiveDate>,
    pub deleted: Option<bool>,
}

impl SubscriptionNotice {
    pub fn external_reference(&self) -> Option<&str> {
        non_blank(&self.external_reference)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceNotice {
    pub id: Option<String>,
    /// Gateway id of the invoiced charge.
    pub payment: Option<String>,
    pub status: Option<String>,
    pub external_reference: Option<String>,
    pub value: Option<Decimal>,
    pub payment_link: Option<String>,
}

impl InvoiceNotice {
    pub fn external_reference(&self) -> Option<&str> {
        non_blank(&self.external_reference)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_payment_notification() {
        let body = r#"{"event":"PAYMENT_RECEIVED","payment":{"externalReference":"ch-1","status":"RECEIVED"}}"#;
        let n: WebhookNotification = serde_json::from_str(body).unwrap();

        assert_eq!(n.event, "PAYMENT_RECEIVED");
        let payment = n.payment.unwrap();
        assert_eq!(payment.external_reference(), Some("ch-1"));
        assert_eq!(payment.status.as_deref(), Some("RECEIVED"));
        assert!(n.invoice.is_none());
        assert!(n.subscription.is_none());
    }

    #[test]
    fn parses_full_gateway_payment_object() {
        let body = r#"{
            "event": "PAYMENT_CREATED",
            "payment": {
                "object": "payment",
                "id": "pay_080225913252",
                "dateCreated": "2025-01-01",
                "customer": "cus_G7Dvo4iphUNk",
                "subscription": "sub_VXJBYgP2u0eO",
                "value": 49.9,
                "netValue": 48.9,
                "billingType": "PIX",
                "status": "PENDING",
                "dueDate": "2025-02-01",
                "description": null,
                "externalReference": null,
                "invoiceUrl": "https://www.asaas.com/i/080225913252",
                "transactionReceiptUrl": null,
                "deleted": false
            }
        }"#;
        let n: WebhookNotification = serde_json::from_str(body).unwrap();
        let p = n.payment.unwrap();

        assert_eq!(p.remote_id(), Some("pay_080225913252"));
        assert_eq!(p.subscription_reference(), Some("sub_VXJBYgP2u0eO"));
        assert_eq!(p.value, Some(Decimal::new(499, 1)));
        assert_eq!(p.due_date, NaiveDate::from_ymd_opt(2025, 2, 1));
        assert_eq!(p.external_reference(), None);
    }

    #[test]
    fn blank_references_count_as_absent() {
        let notice = ChargeNotice {
            external_reference: Some("   ".to_string()),
            subscription: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(notice.external_reference(), None);
        assert_eq!(notice.subscription_reference(), None);
    }
}
