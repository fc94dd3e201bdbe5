use crate::models::db_operations::videos_db_operations::DbError;
use crate::publish::PublishError;
use crate::storage::StorageError;
use actix_multipart::MultipartError;
use actix_web::error::BlockingError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Every failure a request can end in. Client-facing variants carry a
/// specific reason; the rest collapse into an opaque 500.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Unauthenticated(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    InvalidTarget(String),
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    UpstreamFailure(String),
    #[error("Video database error: {0}")]
    Database(DbError),
    #[error("Users database error: {0}")]
    Rusqlite(#[from] rusqlite::Error),
    #[error("R2D2 Pool error: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("Blocking task failed: {0}")]
    Blocking(#[from] BlockingError),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn is_internal(&self) -> bool {
        matches!(
            self,
            ApiError::Database(_) | ApiError::Rusqlite(_) | ApiError::Pool(_) | ApiError::Blocking(_) | ApiError::Internal(_)
        )
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound(what) => ApiError::NotFound(what),
            other => ApiError::Database(other),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        ApiError::UpstreamFailure(format!("Object storage failed: {}", e))
    }
}

impl From<PublishError> for ApiError {
    fn from(e: PublishError) -> Self {
        ApiError::UpstreamFailure(format!("Publishing platform failed: {}", e))
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        ApiError::InvalidInput(format!("Malformed upload: {}", e))
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidTarget(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::UpstreamFailure(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = if self.is_internal() {
            log::error!("Request failed with an internal error: {}", self);
            "Internal server error".to_string()
        } else {
            if let ApiError::UpstreamFailure(reason) = self {
                log::warn!("Upstream collaborator failure: {}", reason);
            } else {
                log::debug!("Request rejected: {}", self);
            }
            self.to_string()
        };

        HttpResponse::build(self.status_code()).json(json!({ "success": false, "error": message }))
    }
}
