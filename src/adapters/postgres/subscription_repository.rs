//! PostgreSQL implementation of SubscriptionRepository.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::domain::billing::{BillingType, Cycle, GatewayStatus, Subscription, SubscriptionPlan};
use crate::domain::foundation::{CustomerId, DomainError, ErrorCode, SubscriptionId, Timestamp};
use crate::ports::SubscriptionRepository;

use super::common::{correlation, database_error, parse_column, to_i32, to_u32, violates};

pub struct PostgresSubscriptionRepository {
    pool: PgPool,
}

impl PostgresSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: String,
    remote_id: Option<String>,
    customer_id: String,
    billing_type: String,
    value: Decimal,
    cycle: String,
    next_due_date: NaiveDate,
    description: Option<String>,
    end_date: Option<NaiveDate>,
    max_payments: Option<i32>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = DomainError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        Ok(Subscription {
            correlation: correlation(SubscriptionId::new(row.id)?, row.remote_id)?,
            customer_id: CustomerId::new(row.customer_id)?,
            plan: SubscriptionPlan {
                billing_type: parse_column::<BillingType>("billing_type", &row.billing_type)?,
                value: row.value,
                cycle: parse_column::<Cycle>("cycle", &row.cycle)?,
                next_due_date: row.next_due_date,
                description: row.description,
                end_date: row.end_date,
                max_payments: to_u32("max_payments", row.max_payments)?,
            },
            status: GatewayStatus::new(row.status),
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionRepository {
    async fn save(&self, subscription: &Subscription) -> Result<(), DomainError> {
        let plan = &subscription.plan;
        sqlx::query(
            r#"
            INSERT INTO subscriptions (
                id, remote_id, customer_id, billing_type, value, cycle, next_due_date,
                description, end_date, max_payments, status, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(subscription.id().as_str())
        .bind(subscription.remote_id().map(|r| r.as_str()))
        .bind(subscription.customer_id.as_str())
        .bind(plan.billing_type.as_str())
        .bind(plan.value)
        .bind(plan.cycle.as_str())
        .bind(plan.next_due_date)
        .bind(&plan.description)
        .bind(plan.end_date)
        .bind(to_i32("max_payments", plan.max_payments)?)
        .bind(subscription.status.as_str())
        .bind(*subscription.created_at.as_datetime())
        .bind(*subscription.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if violates(&e, "subscriptions_pkey") || violates(&e, "subscriptions_remote_id_key") {
                return DomainError::new(ErrorCode::ValidationFailed, "Subscription already exists")
                    .with_detail("subscription_id", subscription.id().to_string());
            }
            database_error("save subscription", e)
        })?;

        Ok(())
    }

    async fn find_by_id(&self, id: &SubscriptionId) -> Result<Option<Subscription>, DomainError> {
        self.find_by_external_reference(id.as_str()).await
    }

    async fn find_by_external_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Subscription>, DomainError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(
            r#"
            SELECT id, remote_id, customer_id, billing_type, value, cycle, next_due_date,
                   description, end_date, max_payments, status, created_at, updated_at
            FROM subscriptions
            WHERE id = $1
            "#,
        )
        .bind(reference)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| database_error("find subscription", e))?;

        row.map(Subscription::try_from).transpose()
    }

    async fn update_status(
        &self,
        id: &SubscriptionId,
        status: &GatewayStatus,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            "UPDATE subscriptions SET status = $2, updated_at = $3 WHERE id = $1",
        )
        .bind(id.as_str())
        .bind(status.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| database_error("update subscription status", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::SubscriptionNotFound,
                format!("Subscription {} not found", id),
            ));
        }

        Ok(())
    }
}
