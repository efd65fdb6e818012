use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use reelgap_core::AvailabilityError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "message": self.message,
                "status": self.status.as_u16(),
            }
        }));

        (self.status, body).into_response()
    }
}

impl From<AvailabilityError> for AppError {
    fn from(err: AvailabilityError) -> Self {
        match err {
            AvailabilityError::Parse(msg) => Self::bad_request(msg),
            AvailabilityError::UnresolvedMedia => Self::not_found(err.to_string()),
            AvailabilityError::NotFound(msg) => Self::not_found(msg),
            AvailabilityError::ProbeUnavailable(_) => {
                tracing::warn!(error = %err, "probe failure escaped the existence chain");
                Self::service_unavailable("Media servers unavailable")
            }
            AvailabilityError::Store(msg) => {
                tracing::error!(error = %msg, "local media index failed");
                Self::internal("Local media index unavailable")
            }
            AvailabilityError::CatalogUnavailable(source) => {
                tracing::error!(error = %source, "metadata catalog failed");
                Self::bad_gateway("Metadata catalog unavailable")
            }
            AvailabilityError::Internal(msg) => {
                tracing::error!(error = %msg, "internal availability error");
                Self::internal("Internal server error")
            }
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelgap_core::ProviderError;

    #[test]
    fn availability_errors_map_to_status_codes() {
        let cases = [
            (AvailabilityError::Parse("bad".into()), StatusCode::BAD_REQUEST),
            (AvailabilityError::UnresolvedMedia, StatusCode::NOT_FOUND),
            (AvailabilityError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AvailabilityError::Store("down".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (
                AvailabilityError::CatalogUnavailable(ProviderError::RateLimited),
                StatusCode::BAD_GATEWAY,
            ),
            (AvailabilityError::Internal("oops".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(AppError::from(err).status, status);
        }
    }

    #[test]
    fn unresolved_media_keeps_its_message() {
        let err = AppError::from(AvailabilityError::UnresolvedMedia);
        assert_eq!(err.message, "media information not found");
    }
}
