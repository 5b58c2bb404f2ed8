use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;

use crate::models::Movie;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A read statement failed or a row did not decode.
    #[error(transparent)]
    Query(DbErr),

    /// An insert, update or delete failed.
    #[error(transparent)]
    Exec(DbErr),

    #[error("movie {0} not found")]
    NotFound(i32),

    #[error("error: movie id already exists")]
    DuplicateKey { id: i32 },

    /// The update went through but reading the row back did not. `written`
    /// is what the caller sent.
    #[error("{source}")]
    Refetch { written: Box<Movie>, source: Box<AppError> },

    #[error("operation cancelled")]
    Cancelled,

    #[error("deadline exceeded")]
    DeadlineExceeded,
}

impl AppError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.to_string() });
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
