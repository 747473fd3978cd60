use anyhow::anyhow;
use gatehouse_core::AppError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("entity not found")]
    NotFound,

    /// Unique constraint violation, carrying the offending field
    #[error("{0} already exists")]
    Conflict(String),

    /// Referenced row does not exist
    #[error("invalid reference: {0}")]
    InvalidReference(String),

    #[error("store failure: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                let field = match db_err.constraint() {
                    Some(c) if c.contains("email") => "email",
                    Some(c) if c.contains("username") => "username",
                    Some(c) if c.contains("code") => "role code",
                    _ => "record",
                };
                StoreError::Conflict(field.to_string())
            }
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                StoreError::InvalidReference(
                    db_err.constraint().unwrap_or("foreign key").to_string(),
                )
            }
            _ => StoreError::Backend(err.to_string()),
        }
    }
}

impl StoreError {
    /// Converts into the HTTP rejection. `entity` names what was looked up,
    /// for the 404 message. Backend detail is logged, never sent.
    pub fn into_app_error(self, entity: &str) -> AppError {
        match self {
            StoreError::NotFound => AppError::not_found(anyhow!("{entity} not found")),
            StoreError::Conflict(_) => AppError::bad_request(self),
            StoreError::InvalidReference(constraint) => {
                tracing::debug!(%constraint, "Rejected dangling reference");
                AppError::bad_request(anyhow!("referenced role does not exist"))
            }
            StoreError::Backend(detail) => {
                tracing::error!(%detail, "Store operation failed");
                AppError::internal_error("storage failure")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        assert_eq!(StoreError::from(sqlx::Error::RowNotFound), StoreError::NotFound);
    }

    #[test]
    fn test_other_errors_are_backend() {
        let err = StoreError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, StoreError::Backend(_)));
    }

    #[test]
    fn test_conflict_message() {
        assert_eq!(
            StoreError::Conflict("username".to_string()).to_string(),
            "username already exists"
        );
    }

    #[test]
    fn test_into_app_error_statuses() {
        use axum::http::StatusCode;

        let err = StoreError::NotFound.into_app_error("user");
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message(), "user not found");

        let err = StoreError::Conflict("email".to_string()).into_app_error("user");
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "email already exists");

        let err = StoreError::InvalidReference("users_role_id_fkey".to_string()).into_app_error("user");
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let err = StoreError::Backend("connection reset".to_string()).into_app_error("user");
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), "storage failure");
    }
}
