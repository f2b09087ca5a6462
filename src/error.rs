use axum::{
    extract::{multipart::MultipartError, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::{inbody::services::ReplyError, llm::LlmError, ocr::OcrError};

/// Every handler failure. Rendered as
/// `{"success": false, "error": <kind>, "message": <text>}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Multipart error: {0}")]
    Multipart(#[from] MultipartError),
    #[error("Invalid JSON body: {0}")]
    Json(#[from] JsonRejection),
    #[error(transparent)]
    Ocr(#[from] OcrError),
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error("model reply could not be read as InBody metrics: {source}")]
    InvalidReply { source: ReplyError, reply: String },
}

impl ApiError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Multipart(e) => (e.status(), "bad_request"),
            ApiError::Json(e) => (e.status(), "bad_request"),
            ApiError::Ocr(_) => (StatusCode::BAD_GATEWAY, "ocr_failed"),
            ApiError::Llm(_) => (StatusCode::BAD_GATEWAY, "llm_failed"),
            ApiError::InvalidReply { .. } => (StatusCode::BAD_GATEWAY, "invalid_llm_reply"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();
        let message = self.to_string();
        if status.is_server_error() {
            error!(%status, kind, error = %message, "request failed");
        } else {
            warn!(%status, kind, error = %message, "request rejected");
        }

        let mut body = json!({
            "success": false,
            "error": kind,
            "message": message,
        });
        if let ApiError::InvalidReply { reply, .. } = self {
            body["extracted"] = json!(reply);
        }
        (status, Json(body)).into_response()
    }
}
