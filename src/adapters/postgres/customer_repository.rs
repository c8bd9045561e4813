//! PostgreSQL implementation of CustomerRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::billing::{Customer, CustomerProfile};
use crate::domain::foundation::{CustomerId, DomainError, ErrorCode, Timestamp};
use crate::ports::CustomerRepository;

use super::common::{correlation, database_error, violates};

pub struct PostgresCustomerRepository {
    pool: PgPool,
}

impl PostgresCustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: String,
    remote_id: Option<String>,
    name: String,
    email: Option<String>,
    cpf_cnpj: String,
    phone: Option<String>,
    mobile_phone: Option<String>,
    address: Option<String>,
    address_number: Option<String>,
    complement: Option<String>,
    province: Option<String>,
    postal_code: Option<String>,
    notification_disabled: bool,
    additional_emails: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CustomerRow> for Customer {
    type Error = DomainError;

    fn try_from(row: CustomerRow) -> Result<Self, Self::Error> {
        let id = CustomerId::new(row.id)?;
        Ok(Customer {
            correlation: correlation(id, row.remote_id)?,
            profile: CustomerProfile {
                name: row.name,
                email: row.email,
                cpf_cnpj: row.cpf_cnpj,
                phone: row.phone,
                mobile_phone: row.mobile_phone,
                address: row.address,
                address_number: row.address_number,
                complement: row.complement,
                province: row.province,
                postal_code: row.postal_code,
                notification_disabled: row.notification_disabled,
                additional_emails: row.additional_emails,
            },
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

#[async_trait]
impl CustomerRepository for PostgresCustomerRepository {
    async fn save(&self, customer: &Customer) -> Result<(), DomainError> {
        let p = &customer.profile;
        sqlx::query(
            r#"
            INSERT INTO customers (
                id, remote_id, name, email, cpf_cnpj, phone, mobile_phone, address,
                address_number, complement, province, postal_code, notification_disabled,
                additional_emails, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(customer.id().as_str())
        .bind(customer.remote_id().map(|r| r.as_str()))
        .bind(&p.name)
        .bind(&p.email)
        .bind(&p.cpf_cnpj)
        .bind(&p.phone)
        .bind(&p.mobile_phone)
        .bind(&p.address)
        .bind(&p.address_number)
        .bind(&p.complement)
        .bind(&p.province)
        .bind(&p.postal_code)
        .bind(p.notification_disabled)
        .bind(&p.additional_emails)
        .bind(*customer.created_at.as_datetime())
        .bind(*customer.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if violates(&e, "customers_pkey") || violates(&e, "customers_remote_id_key") {
                return DomainError::new(ErrorCode::ValidationFailed, "Customer already exists")
                    .with_detail("field", "id");
            }
            database_error("save customer", e)
        })?;

        Ok(())
    }

    async fn find_by_id(&self, id: &CustomerId) -> Result<Option<Customer>, DomainError> {
        let row: Option<CustomerRow> = sqlx::query_as(
            r#"
            SELECT id, remote_id, name, email, cpf_cnpj, phone, mobile_phone, address,
                   address_number, complement, province, postal_code, notification_disabled,
                   additional_emails, created_at, updated_at
            FROM customers
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| database_error("find customer", e))?;

        row.map(Customer::try_from).transpose()
    }
}
