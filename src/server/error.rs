use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::discovery::DiscoveryError;
use crate::util::ValidationError;

/// An error on its way out of the API.
///
/// Splits every failure into a client half and a server half: the response
/// carries only the status, a generic category message, and a correlation
/// ID, while the full detail goes to the log under that same ID. Nothing
/// about the target — hostname, path, upstream error text — reaches the
/// client.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    detail: String,
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    #[serde(rename = "errorId")]
    error_id: String,
}

impl ApiError {
    /// The request body was not valid JSON of the expected shape.
    pub fn invalid_body(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: "Invalid request body".to_owned(),
            detail: detail.into(),
        }
    }

    /// The `url` field was absent or empty.
    pub fn missing_url() -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: "URL is required".to_owned(),
            detail: "request body has no usable url field".to_owned(),
        }
    }

    /// Normalization or SSRF validation refused the input. The validator's
    /// messages are category strings, safe to show as-is.
    pub fn validation(err: ValidationError) -> Self {
        let message = match err {
            ValidationError::InvalidFormat => "Invalid URL format".to_owned(),
            other => other.to_string(),
        };
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: message.clone(),
            message,
        }
    }

    /// Discovery failed outright (both branches came up empty-handed).
    pub fn discovery(err: DiscoveryError) -> Self {
        let (status, message) = match &err {
            DiscoveryError::FetchFailed {
                status: Some(404), ..
            } => (StatusCode::NOT_FOUND, "Target page not found"),
            DiscoveryError::FetchFailed { .. } => {
                (StatusCode::BAD_GATEWAY, "Unable to fetch the target site")
            }
            DiscoveryError::Network(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Network error while contacting the target site",
            ),
            DiscoveryError::Timeout => (
                StatusCode::REQUEST_TIMEOUT,
                "The request to the target site timed out",
            ),
            DiscoveryError::Parsing => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to process the response from the target site",
            ),
            DiscoveryError::TooLarge => (
                StatusCode::BAD_GATEWAY,
                "The response from the target site was too large",
            ),
        };
        Self {
            status,
            message: message.to_owned(),
            detail: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v4().to_string();
        tracing::error!(
            error_id = %error_id,
            status = %self.status,
            detail = %self.detail,
            "request failed"
        );

        let body = ErrorBody {
            success: false,
            error: self.message,
            error_id,
        };
        (self.status, Json(body)).into_response()
    }
}
