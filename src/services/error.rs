//! Domain error taxonomy shared by the account and branch components.

use std::future::Future;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("storage I/O error: {0}")]
    StorageIo(String),

    #[error("operation exceeded its {0:?} limit")]
    Timeout(Duration),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("credential expired")]
    CredentialExpired,

    #[error("invalid credential: {0}")]
    CredentialInvalid(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.message().contains("UNIQUE constraint failed") => {
                ServiceError::Conflict("User with this email already exists".to_string())
            }
            _ => ServiceError::Persistence(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::Persistence(format!("document encoding failed: {}", err))
    }
}

/// Run a store or file operation under a wall-clock ceiling.
///
/// Dropping the future on expiry aborts the pending store call only; files
/// already written by the task stay on disk.
pub async fn bounded<T, F>(limit: Duration, fut: F) -> ServiceResult<T>
where
    F: Future<Output = ServiceResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(limit_ms = limit.as_millis() as u64, "Operation timed out");
            Err(ServiceError::Timeout(limit))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bounded_passes_result_through() {
        let value = bounded(Duration::from_secs(1), async { Ok::<_, ServiceError>(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_bounded_times_out() {
        let result = bounded(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, ServiceError>(())
        })
        .await;
        assert!(matches!(result, Err(ServiceError::Timeout(_))));
    }
}
