use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

use crate::model::LlmError;
use crate::web::models::ErrorResponse;

pub const MESSAGE_REQUIRED: &str = "Message is required and must be a non-empty string";
pub const INVALID_JSON: &str = "Invalid JSON body";

/// Errors surfaced to chat clients. The `Display` text is the phrase sent
/// in the `error` field, so it must never include provider output.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("{0}")]
    InvalidInput(&'static str),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("Invalid OpenAI API key")]
    Unauthorized,

    #[error("OpenAI API quota exceeded. Please check your billing.")]
    QuotaExceeded,

    #[error("OpenAI API key not configured")]
    ConfigurationMissing,

    #[error("Failed to generate response from OpenAI")]
    ProviderFailure,

    #[error("Internal server error")]
    InternalError,
}

impl ResponseError for ChatError {
    fn status_code(&self) -> StatusCode {
        match self {
            ChatError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ChatError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ChatError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ChatError::Unauthorized => StatusCode::UNAUTHORIZED,
            ChatError::QuotaExceeded => StatusCode::TOO_MANY_REQUESTS,
            ChatError::ConfigurationMissing
            | ChatError::ProviderFailure
            | ChatError::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
        })
    }
}

impl From<LlmError> for ChatError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::ConfigurationMissing => ChatError::ConfigurationMissing,
            LlmError::Unauthorized => ChatError::Unauthorized,
            LlmError::QuotaExceeded => ChatError::QuotaExceeded,
            LlmError::ProviderFailure(_) => ChatError::ProviderFailure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_error_table() {
        let cases = [
            (ChatError::InvalidInput(MESSAGE_REQUIRED), 400),
            (ChatError::MethodNotAllowed, 405),
            (ChatError::PayloadTooLarge, 413),
            (ChatError::Unauthorized, 401),
            (ChatError::QuotaExceeded, 429),
            (ChatError::ConfigurationMissing, 500),
            (ChatError::ProviderFailure, 500),
            (ChatError::InternalError, 500),
        ];
        for (err, status) in cases {
            assert_eq!(err.status_code().as_u16(), status, "{:?}", err);
        }
    }

    #[test]
    fn provider_detail_is_not_exposed() {
        let err = ChatError::from(LlmError::ProviderFailure(
            "status 503: upstream secret body".to_string(),
        ));
        assert_eq!(err.to_string(), "Failed to generate response from OpenAI");
    }
}
