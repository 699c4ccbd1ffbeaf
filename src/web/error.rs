use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::database::StoreError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(&'static str),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Missing rows become a plain 404. Storage failures are logged in full and
/// answered with a bare 500 so no detail reaches the client.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound(message) => {
                tracing::debug!(reason = message, "Lookup found no row.");
                (StatusCode::NOT_FOUND, message).into_response()
            }
            AppError::Store(store_err) => {
                tracing::error!(error = ?store_err, "Store operation failed.");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
        }
    }
}
