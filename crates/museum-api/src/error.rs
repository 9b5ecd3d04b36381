use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("You do not have permission to perform this action")]
    Forbidden,

    #[error("Premium membership required to view this artwork")]
    PremiumRequired,

    #[error("Comments are disabled for this artwork")]
    CommentsDisabled,

    #[error("Artwork not found")]
    ArtworkNotFound,

    #[error("Comment not found")]
    CommentNotFound,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Username already exists")]
    DuplicateUsername,

    #[error("{0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden | Self::PremiumRequired | Self::CommentsDisabled => StatusCode::FORBIDDEN,
            Self::ArtworkNotFound | Self::CommentNotFound | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::DuplicateUsername | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code sent as `error` in the response body.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "Unauthorized",
            Self::Forbidden => "Forbidden",
            Self::PremiumRequired => "PremiumRequired",
            Self::CommentsDisabled => "CommentsDisabled",
            Self::ArtworkNotFound | Self::CommentNotFound | Self::NotFound(_) => "NotFound",
            Self::DuplicateUsername => "DuplicateUsername",
            Self::Validation(_) => "ValidationError",
            Self::Internal(_) => "InternalError",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            Self::Internal(e) => {
                tracing::error!("Internal error: {:#}", e);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({ "error": self.code(), "message": message }));
        (self.status(), body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
