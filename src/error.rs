//! Request-level errors and their mapping onto HTTP responses.
//!
//! The `Display` text of an [`ApiError`] carries the internal cause and only
//! goes to the log. Clients see [`ApiError::public_message`].

use crate::fetch::FetchError;
use crate::input::InputError;
use crate::model::ModelError;
use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InputError),

    #[error("malformed request body: {0}")]
    MalformedBody(String),

    #[error("Model not loaded")]
    ModelNotLoaded,

    #[error("fetch failed: {0}")]
    FetchFailure(FetchError),

    #[error("decode failed: {0}")]
    DecodeFailure(FetchError),

    #[error("inference failed: {0}")]
    InferenceError(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Body of every non-200 response
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ApiError {
    /// Text that is safe to hand back to the client
    pub fn public_message(&self) -> String {
        match self {
            ApiError::InvalidInput(e) => e.to_string(),
            ApiError::MalformedBody(_) => "Malformed JSON request body.".into(),
            ApiError::ModelNotLoaded => "Model not loaded".into(),
            ApiError::FetchFailure(_) => "Failed to fetch image from URL.".into(),
            ApiError::DecodeFailure(_) => "Failed to decode image.".into(),
            ApiError::InferenceError(_) => "Error during inference.".into(),
            ApiError::Internal(_) => "Internal server error.".into(),
        }
    }
}

impl From<FetchError> for ApiError {
    fn from(err: FetchError) -> ApiError {
        if err.is_decode() {
            ApiError::DecodeFailure(err)
        } else {
            ApiError::FetchFailure(err)
        }
    }
}

impl From<ModelError> for ApiError {
    fn from(err: ModelError) -> ApiError {
        ApiError::InferenceError(err.to_string())
    }
}

impl From<actix_web::error::BlockingError> for ApiError {
    fn from(err: actix_web::error::BlockingError) -> ApiError {
        ApiError::Internal(err.to_string())
    }
}

impl actix_web::error::ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        } else {
            warn!(error = %self, "request rejected");
        }

        HttpResponse::build(status)
            .insert_header(ContentType::json())
            .json(ErrorBody {
                error: self.public_message(),
            })
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) | ApiError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            ApiError::ModelNotLoaded
            | ApiError::FetchFailure(_)
            | ApiError::DecodeFailure(_)
            | ApiError::InferenceError(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::ResponseError;

    #[test]
    fn test_status_table() {
        assert_eq!(
            ApiError::from(InputError::Missing).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::MalformedBody("eof".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::ModelNotLoaded.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::InferenceError("shape".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_detail_is_not_public() {
        let err = ApiError::from(ModelError::Inference(
            "Evaluating #3 \"conv2d\": /secret/path".into(),
        ));
        assert_eq!(err.public_message(), "Error during inference.");
        assert!(err.to_string().contains("/secret/path"));

        let err = ApiError::Internal("thread pool is gone".into());
        assert_eq!(err.public_message(), "Internal server error.");
    }

    #[test]
    fn test_decode_errors_are_told_apart() {
        let decode = crate::fetch::decode_image(b"nope").unwrap_err();
        let err = ApiError::from(decode);
        assert!(matches!(err, ApiError::DecodeFailure(_)));
        assert_eq!(err.public_message(), "Failed to decode image.");
    }

    #[test]
    fn test_missing_input_message() {
        assert_eq!(
            ApiError::from(InputError::Missing).public_message(),
            "No valid input image provided."
        );
    }
}
