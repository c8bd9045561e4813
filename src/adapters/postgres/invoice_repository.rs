//! PostgreSQL implementation of InvoiceRepository.
//!
//! The `invoices_charge_id_key` unique constraint is the last line of the
//! one-invoice-per-charge rule; a violation surfaces as
//! `ErrorCode::InvoiceAlreadyIssued`. `invoices_external_reference_key` keeps
//! webhook lookups by reference unambiguous.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::domain::billing::{GatewayStatus, Invoice, InvoiceDetails, InvoiceTaxes};
use crate::domain::foundation::{ChargeId, DomainError, ErrorCode, InvoiceId, Timestamp};
use crate::ports::InvoiceRepository;

use super::common::{correlation, database_error, violates};

const SELECT_INVOICE: &str = r#"
    SELECT id, remote_id, charge_id, external_reference, service_description, observations,
           value, deductions, effective_date, municipal_service_id, municipal_service_code,
           municipal_service_name, update_payment, taxes_retain_iss, taxes_cofins, taxes_csll,
           taxes_inss, taxes_ir, taxes_pis, taxes_iss, status, payment_link,
           created_at, updated_at
    FROM invoices
"#;

const CHARGE_UNIQUE_CONSTRAINT: &str = "invoices_charge_id_key";
const REFERENCE_UNIQUE_CONSTRAINT: &str = "invoices_external_reference_key";

pub struct PostgresInvoiceRepository {
    pool: PgPool,
}

impl PostgresInvoiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_where(
        &self,
        column: &str,
        value: &str,
    ) -> Result<Option<Invoice>, DomainError> {
        let sql = format!("{} WHERE {} = $1 LIMIT 1", SELECT_INVOICE, column);
        let row: Option<InvoiceRow> = sqlx::query_as(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| database_error("find invoice", e))?;

        row.map(Invoice::try_from).transpose()
    }
}

#[derive(Debug, sqlx::FromRow)]
struct InvoiceRow {
    id: String,
    remote_id: Option<String>,
    charge_id: String,
    external_reference: String,
    service_description: String,
    observations: String,
    value: Decimal,
    deductions: Decimal,
    effective_date: NaiveDate,
    municipal_service_id: Option<String>,
    municipal_service_code: Option<String>,
    municipal_service_name: String,
    update_payment: bool,
    taxes_retain_iss: bool,
    taxes_cofins: Decimal,
    taxes_csll: Decimal,
    taxes_inss: Decimal,
    taxes_ir: Decimal,
    taxes_pis: Decimal,
    taxes_iss: Decimal,
    status: String,
    payment_link: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<InvoiceRow> for Invoice {
    type Error = DomainError;

    fn try_from(row: InvoiceRow) -> Result<Self, Self::Error> {
        Ok(Invoice {
            correlation: correlation(InvoiceId::new(row.id)?, row.remote_id)?,
            charge_id: ChargeId::new(row.charge_id)?,
            external_reference: row.external_reference,
            details: InvoiceDetails {
                service_description: row.service_description,
                observations: row.observations,
                value: row.value,
                deductions: row.deductions,
                effective_date: row.effective_date,
                municipal_service_id: row.municipal_service_id,
                municipal_service_code: row.municipal_service_code,
                municipal_service_name: row.municipal_service_name,
                update_payment: row.update_payment,
                taxes: InvoiceTaxes {
                    retain_iss: row.taxes_retain_iss,
                    cofins: row.taxes_cofins,
                    csll: row.taxes_csll,
                    inss: row.taxes_inss,
                    ir: row.taxes_ir,
                    pis: row.taxes_pis,
                    iss: row.taxes_iss,
                },
            },
            status: GatewayStatus::new(row.status),
            payment_link: row.payment_link,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

#[async_trait]
impl InvoiceRepository for PostgresInvoiceRepository {
    async fn save(&self, invoice: &Invoice) -> Result<(), DomainError> {
        let d = &invoice.details;
        sqlx::query(
            r#"
            INSERT INTO invoices (
                id, remote_id, charge_id, external_reference, service_description, observations,
                value, deductions, effective_date, municipal_service_id, municipal_service_code,
                municipal_service_name, update_payment, taxes_retain_iss, taxes_cofins,
                taxes_csll, taxes_inss, taxes_ir, taxes_pis, taxes_iss, status, payment_link,
                created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24
            )
            "#,
        )
        .bind(invoice.id().as_str())
        .bind(invoice.remote_id().map(|r| r.as_str()))
        .bind(invoice.charge_id.as_str())
        .bind(&invoice.external_reference)
        .bind(&d.service_description)
        .bind(&d.observations)
        .bind(d.value)
        .bind(d.deductions)
        .bind(d.effective_date)
        .bind(&d.municipal_service_id)
        .bind(&d.municipal_service_code)
        .bind(&d.municipal_service_name)
        .bind(d.update_payment)
        .bind(d.taxes.retain_iss)
        .bind(d.taxes.cofins)
        .bind(d.taxes.csll)
        .bind(d.taxes.inss)
        .bind(d.taxes.ir)
        .bind(d.taxes.pis)
        .bind(d.taxes.iss)
        .bind(invoice.status.as_str())
        .bind(&invoice.payment_link)
        .bind(*invoice.created_at.as_datetime())
        .bind(*invoice.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if violates(&e, CHARGE_UNIQUE_CONSTRAINT) {
                return DomainError::new(
                    ErrorCode::InvoiceAlreadyIssued,
                    format!("Charge {} already has an invoice", invoice.charge_id),
                )
                .with_detail("charge_id", invoice.charge_id.to_string());
            }
            if violates(&e, REFERENCE_UNIQUE_CONSTRAINT) {
                return DomainError::new(
                    ErrorCode::ValidationFailed,
                    format!(
                        "Invoice reference {} is already in use",
                        invoice.external_reference
                    ),
                )
                .with_detail("field", "external_reference");
            }
            if violates(&e, "invoices_pkey") || violates(&e, "invoices_remote_id_key") {
                return DomainError::new(ErrorCode::ValidationFailed, "Invoice already exists")
                    .with_detail("invoice_id", invoice.id().to_string());
            }
            database_error("save invoice", e)
        })?;

        Ok(())
    }

    async fn find_by_id(&self, id: &InvoiceId) -> Result<Option<Invoice>, DomainError> {
        self.fetch_one_where("id", id.as_str()).await
    }

    async fn find_by_charge_id(&self, charge_id: &ChargeId) -> Result<Option<Invoice>, DomainError> {
        self.fetch_one_where("charge_id", charge_id.as_str()).await
    }

    async fn find_by_external_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Invoice>, DomainError> {
        self.fetch_one_where("external_reference", reference).await
    }

    async fn update_status(&self, id: &InvoiceId, status: &GatewayStatus) -> Result<(), DomainError> {
        let result = sqlx::query("UPDATE invoices SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(id.as_str())
            .bind(status.as_str())
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(|e| database_error("update invoice status", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::InvoiceNotFound,
                format!("Invoice {} not found", id),
            ));
        }

        Ok(())
    }
}
