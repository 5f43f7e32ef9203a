use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use prompt_converter::ConvertError;
use serde_json::json;
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request body: {0}")]
    InvalidBody(#[from] JsonRejection),

    #[error(transparent)]
    Convert(#[from] ConvertError),
}

impl ApiError {
    fn status_and_type(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::InvalidBody(rejection) => (rejection.status(), "invalid_request_error"),
            ApiError::Convert(ConvertError::EmptyContent { .. })
            | ApiError::Convert(ConvertError::UnexpectedContent { .. }) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "invalid_request_error")
            }
            ApiError::Convert(ConvertError::Serialize(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "api_error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = self.status_and_type();
        warn!(%status, "Request failed: {self}");

        (
            status,
            Json(json!({
                "type": "error",
                "error": {
                    "type": error_type,
                    "message": self.to_string()
                }
            })),
        )
            .into_response()
    }
}
