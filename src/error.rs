use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;
use tracing::{error, warn};

/// Failures of the persistence layer, shared by every backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    #[error("storage handle unavailable: {0}")]
    Connection(String),

    #[error("database query failed: {0}")]
    Database(#[source] DieselError),
}

impl From<DieselError> for BackendError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                Self::UniqueViolation(info.message().to_owned())
            }
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
                Self::ForeignKeyViolation(info.message().to_owned())
            }
            other => Self::Database(other),
        }
    }
}

impl From<diesel::r2d2::PoolError> for BackendError {
    fn from(err: diesel::r2d2::PoolError) -> Self {
        Self::Connection(err.to_string())
    }
}

/// Errors a request handler can end with.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("invalid date-time `{input}`")]
    InvalidDateTime { input: String },
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Backend(BackendError::UniqueViolation(_)) => {
                (StatusCode::CONFLICT, "E-mail já cadastrado")
            }
            Self::Backend(BackendError::ForeignKeyViolation(_)) => {
                (StatusCode::CONFLICT, "Usuário inexistente")
            }
            Self::Backend(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Erro interno do servidor"),
            Self::InvalidDateTime { .. } => (StatusCode::BAD_REQUEST, "Data e hora inválidas"),
        };

        if status.is_server_error() {
            error!(err = %self, "Request failed");
        } else {
            warn!(err = %self, "Request rejected");
        }

        (status, message.to_string()).into_response()
    }
}

/// Errors that stop the server before or while it serves.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("--create-tables needs a database url")]
    MissingDatabaseUrl,

    #[error("failed to check out a connection for migrations: {0}")]
    Connection(#[from] BackendError),

    #[error("failed to run migrations: {0}")]
    Migration(String),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server stopped unexpectedly: {0}")]
    Serve(#[source] std::io::Error),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test_case::test_case(AppError::Backend(BackendError::UniqueViolation("email".into())), StatusCode::CONFLICT)]
    #[test_case::test_case(AppError::Backend(BackendError::ForeignKeyViolation("usuario_id".into())), StatusCode::CONFLICT)]
    #[test_case::test_case(AppError::Backend(BackendError::Connection("pool timed out".into())), StatusCode::INTERNAL_SERVER_ERROR)]
    #[test_case::test_case(AppError::Backend(BackendError::Database(DieselError::NotFound)), StatusCode::INTERNAL_SERVER_ERROR)]
    #[test_case::test_case(AppError::InvalidDateTime { input: "amanha".into() }, StatusCode::BAD_REQUEST)]
    fn test_status_codes(err: AppError, expected: StatusCode) {
        assert_eq!(err.into_response().status(), expected);
    }

    #[test]
    fn test_diesel_errors_are_classified() {
        let err = BackendError::from(DieselError::NotFound);
        assert!(matches!(err, BackendError::Database(DieselError::NotFound)));

        let err = BackendError::from(DieselError::RollbackTransaction);
        assert!(matches!(err, BackendError::Database(_)));
    }
}
