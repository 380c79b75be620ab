use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use core_config::ConfigError;
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{service} request failed ({status}): {body}")]
    Upstream {
        service: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("{0} returned no result")]
    EmptyResponse(&'static str),

    #[error("Credential error: {0}")]
    Credential(String),

    #[error("Image embeddings are disabled: set VISION_ENDPOINT and VISION_API_KEY")]
    VisionDisabled,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type AiResult<T> = Result<T, AiError>;

/// Upstream and credential failures surface as 502, configuration gaps the
/// caller can work around as 400.
impl From<AiError> for AppError {
    fn from(err: AiError) -> Self {
        match err {
            AiError::VisionDisabled => AppError::BadRequest(err.to_string()),
            AiError::Config(e) => AppError::InternalServerError(e.to_string()),
            other => AppError::BadGateway(other.to_string()),
        }
    }
}

impl IntoResponse for AiError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_maps_to_bad_gateway() {
        let err = AiError::Upstream {
            service: "Azure OpenAI",
            status: StatusCode::TOO_MANY_REQUESTS,
            body: "rate limited".into(),
        };
        assert!(err.to_string().contains("429"));
        let app: AppError = err.into();
        assert_eq!(app.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_vision_disabled_is_bad_request() {
        let app: AppError = AiError::VisionDisabled.into();
        assert_eq!(app.status(), StatusCode::BAD_REQUEST);
    }
}
