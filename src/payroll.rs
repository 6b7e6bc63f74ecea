use std::time::Duration;

use actix_web::{body, http::{self, header::ContentType, StatusCode}, HttpResponse};
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;
use uuid::Uuid;

pub mod aggregator;
pub mod builder;
pub mod generation;
pub mod model;
pub mod query;
pub mod run;
pub mod window;

#[derive(Debug, Error)]
pub enum PayrollError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("worker {0} not found")]
    WorkerNotFound(Uuid),

    #[error("payroll run {0} not found")]
    RunNotFound(Uuid),

    #[error("no payroll run exists yet")]
    NoRuns,

    #[error("payroll run {0} is already paid")]
    AlreadyPaid(Uuid),

    #[error("worker {worker_id} already has an entry in payroll run {run_id}")]
    DuplicateEntry { worker_id: Uuid, run_id: Uuid },

    #[error("invalid payroll run status `{0}`, expected `UNPAID` or `PAID`")]
    InvalidStatus(String),

    #[error("storage error")]
    Storage(#[from] DbErr),

    #[error("storage call timed out after {0:?}")]
    StorageTimeout(Duration),
}

impl PayrollError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Maps a unique violation on `payroll_entry(worker_id, payroll_run_id)` to [`PayrollError::DuplicateEntry`].
    pub(crate) fn from_entry_insert(err: DbErr, worker_id: Uuid, run_id: Uuid) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => Self::DuplicateEntry { worker_id, run_id },
            _ => Self::Storage(err),
        }
    }
}

impl actix_web::error::ResponseError for PayrollError {
    fn error_response(&self) -> HttpResponse<body::BoxBody> {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::plaintext())
            .body(self.to_string())
    }

    fn status_code(&self) -> http::StatusCode {
        match self {
            PayrollError::InvalidInput(_) | PayrollError::InvalidStatus(_) => StatusCode::BAD_REQUEST,
            PayrollError::WorkerNotFound(_) | PayrollError::RunNotFound(_) | PayrollError::NoRuns => StatusCode::NOT_FOUND,
            PayrollError::AlreadyPaid(_) | PayrollError::DuplicateEntry { .. } => StatusCode::CONFLICT,
            PayrollError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            PayrollError::StorageTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}


#[cfg(test)]
mod tests {
    use sea_orm::RuntimeErr;

    use super::*;

    #[test]
    fn test_status_codes() {
        let id = Uuid::new_v4();

        assert_eq!(actix_web::ResponseError::status_code(&PayrollError::invalid("month")), StatusCode::BAD_REQUEST);
        assert_eq!(actix_web::ResponseError::status_code(&PayrollError::InvalidStatus("PAGO".into())), StatusCode::BAD_REQUEST);
        assert_eq!(actix_web::ResponseError::status_code(&PayrollError::WorkerNotFound(id)), StatusCode::NOT_FOUND);
        assert_eq!(actix_web::ResponseError::status_code(&PayrollError::NoRuns), StatusCode::NOT_FOUND);
        assert_eq!(PayrollError::NoRuns.to_string(), "no payroll run exists yet");
        assert_eq!(actix_web::ResponseError::status_code(&PayrollError::AlreadyPaid(id)), StatusCode::CONFLICT);
        assert_eq!(
            actix_web::ResponseError::status_code(&PayrollError::Storage(DbErr::Conn(RuntimeErr::Internal("down".into())))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_non_unique_insert_error_is_storage() {
        let err = PayrollError::from_entry_insert(DbErr::Custom("boom".into()), Uuid::new_v4(), Uuid::new_v4());

        assert!(matches!(err, PayrollError::Storage(_)));
    }
}
