//! GetInvoiceHandler - Query handler for a single invoice.

use std::sync::Arc;

use crate::domain::billing::{BillingError, Invoice};
use crate::domain::foundation::InvoiceId;
use crate::ports::InvoiceRepository;

#[derive(Debug, Clone)]
pub struct GetInvoiceQuery {
    pub invoice_id: InvoiceId,
}

pub struct GetInvoiceHandler {
    invoices: Arc<dyn InvoiceRepository>,
}

impl GetInvoiceHandler {
    pub fn new(invoices: Arc<dyn InvoiceRepository>) -> Self {
        Self { invoices }
    }

    pub async fn handle(&self, query: GetInvoiceQuery) -> Result<Invoice, BillingError> {
        self.invoices
            .find_by_id(&query.invoice_id)
            .await?
            .ok_or_else(|| BillingError::not_found("invoice", &query.invoice_id))
    }
}
