//! PostgreSQL implementation of ChargeRepository.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::domain::billing::{BillingType, Charge, ChargeCallback, ChargeTerms, GatewayStatus};
use crate::domain::foundation::{
    ChargeId, CustomerId, DomainError, ErrorCode, GatewayId, SubscriptionId, Timestamp,
};
use crate::ports::ChargeRepository;

use super::common::{correlation, database_error, parse_column, to_i32, to_u32, violates};

const SELECT_CHARGE: &str = r#"
    SELECT id, remote_id, customer_id, subscription_id, billing_type, value, due_date,
           description, installment_count, callback_success_url, callback_auto_redirect,
           status, invoice_url, receipt_url, created_at, updated_at
    FROM charges
"#;

pub struct PostgresChargeRepository {
    pool: PgPool,
}

impl PostgresChargeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_where(
        &self,
        clause: &str,
        value: &str,
    ) -> Result<Option<Charge>, DomainError> {
        let sql = format!("{} WHERE {} = $1", SELECT_CHARGE, clause);
        let row: Option<ChargeRow> = sqlx::query_as(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| database_error("find charge", e))?;

        row.map(Charge::try_from).transpose()
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ChargeRow {
    id: String,
    remote_id: Option<String>,
    customer_id: String,
    subscription_id: Option<String>,
    billing_type: String,
    value: Decimal,
    due_date: NaiveDate,
    description: Option<String>,
    installment_count: Option<i32>,
    callback_success_url: Option<String>,
    callback_auto_redirect: Option<bool>,
    status: String,
    invoice_url: Option<String>,
    receipt_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ChargeRow> for Charge {
    type Error = DomainError;

    fn try_from(row: ChargeRow) -> Result<Self, Self::Error> {
        let callback = row.callback_success_url.map(|success_url| ChargeCallback {
            success_url,
            auto_redirect: row.callback_auto_redirect.unwrap_or(false),
        });

        Ok(Charge {
            correlation: correlation(ChargeId::new(row.id)?, row.remote_id)?,
            customer_id: CustomerId::new(row.customer_id)?,
            subscription_id: row.subscription_id.map(SubscriptionId::new).transpose()?,
            terms: ChargeTerms {
                billing_type: parse_column::<BillingType>("billing_type", &row.billing_type)?,
                value: row.value,
                due_date: row.due_date,
                description: row.description,
                installment_count: to_u32("installment_count", row.installment_count)?,
                callback,
            },
            status: GatewayStatus::new(row.status),
            invoice_url: row.invoice_url,
            receipt_url: row.receipt_url,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

#[async_trait]
impl ChargeRepository for PostgresChargeRepository {
    async fn save(&self, charge: &Charge) -> Result<(), DomainError> {
        let terms = &charge.terms;
        sqlx::query(
            r#"
            INSERT INTO charges (
                id, remote_id, customer_id, subscription_id, billing_type, value, due_date,
                description, installment_count, callback_success_url, callback_auto_redirect,
                status, invoice_url, receipt_url, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(charge.id().as_str())
        .bind(charge.remote_id().map(|r| r.as_str()))
        .bind(charge.customer_id.as_str())
        .bind(charge.subscription_id.as_ref().map(|s| s.as_str()))
        .bind(terms.billing_type.as_str())
        .bind(terms.value)
        .bind(terms.due_date)
        .bind(&terms.description)
        .bind(to_i32("installment_count", terms.installment_count)?)
        .bind(terms.callback.as_ref().map(|c| c.success_url.as_str()))
        .bind(terms.callback.as_ref().map(|c| c.auto_redirect))
        .bind(charge.status.as_str())
        .bind(&charge.invoice_url)
        .bind(&charge.receipt_url)
        .bind(*charge.created_at.as_datetime())
        .bind(*charge.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if violates(&e, "charges_pkey") || violates(&e, "charges_remote_id_key") {
                return DomainError::new(ErrorCode::ValidationFailed, "Charge already exists")
                    .with_detail("charge_id", charge.id().to_string());
            }
            database_error("save charge", e)
        })?;

        Ok(())
    }

    async fn find_by_id(&self, id: &ChargeId) -> Result<Option<Charge>, DomainError> {
        self.fetch_one_where("id", id.as_str()).await
    }

    async fn find_by_external_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Charge>, DomainError> {
        // The external reference of a charge is its local id.
        self.fetch_one_where("id", reference).await
    }

    async fn find_by_remote_id(
        &self,
        remote_id: &GatewayId,
    ) -> Result<Option<Charge>, DomainError> {
        self.fetch_one_where("remote_id", remote_id.as_str()).await
    }

    async fn update_status(
        &self,
        id: &ChargeId,
        status: &GatewayStatus,
        invoice_url: Option<&str>,
        receipt_url: Option<&str>,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE charges
            SET status = $2,
                invoice_url = COALESCE($3, invoice_url),
                receipt_url = COALESCE($4, receipt_url),
                updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .bind(status.as_str())
        .bind(invoice_url)
        .bind(receipt_url)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| database_error("update charge status", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::ChargeNotFound,
                format!("Charge {} not found", id),
            ));
        }

        Ok(())
    }
}
