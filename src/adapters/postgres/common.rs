//! Row-mapping helpers shared by the billing repositories.

use std::fmt::Display;
use std::str::FromStr;

use crate::domain::foundation::{Correlation, DomainError, ErrorCode, GatewayId};

/// Wraps a sqlx failure, naming what was being done.
pub(super) fn database_error(action: &str, err: sqlx::Error) -> DomainError {
    tracing::error!(error = %err, action, "Database operation failed");
    DomainError::new(ErrorCode::DatabaseError, format!("Failed to {}: {}", action, err))
}

/// True when `err` is a violation of the named constraint.
pub(super) fn violates(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.constraint() == Some(constraint),
        _ => false,
    }
}

/// Parses a stored column, treating bad data as a database error.
pub(super) fn parse_column<T>(column: &str, value: &str) -> Result<T, DomainError>
where
    T: FromStr,
    T::Err: Display,
{
    value.parse::<T>().map_err(|e| {
        DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid {} value '{}': {}", column, value, e),
        )
    })
}

/// Rebuilds a correlation from its stored columns.
pub(super) fn correlation<L: Display>(
    local: L,
    remote_id: Option<String>,
) -> Result<Correlation<L>, DomainError> {
    match remote_id {
        Some(remote) => {
            let remote = GatewayId::new(remote).map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid remote_id: {}", e))
            })?;
            Ok(Correlation::bound(local, remote))
        }
        None => Ok(Correlation::local(local)),
    }
}

pub(super) fn to_i32(column: &str, value: Option<u32>) -> Result<Option<i32>, DomainError> {
    value
        .map(|v| {
            i32::try_from(v).map_err(|_| DomainError::validation(column, "value too large"))
        })
        .transpose()
}

pub(super) fn to_u32(column: &str, value: Option<i32>) -> Result<Option<u32>, DomainError> {
    value
        .map(|v| {
            u32::try_from(v).map_err(|_| {
                DomainError::new(
                    ErrorCode::DatabaseError,
                    format!("Negative {} value: {}", column, v),
                )
            })
        })
        .transpose()
}
