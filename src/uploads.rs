use axum::extract::Multipart;
use bytes::Bytes;
use tracing::debug;

use crate::error::ApiError;

/// Multipart field that carries the report image.
pub const FILE_FIELD: &str = "file";

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// An uploaded image, alive for the duration of one request.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub body: Bytes,
    pub content_type: String,
    pub file_name: Option<String>,
}

/// Pulls the `file` part out of a multipart body. Other parts are skipped.
pub async fn read_image(mp: &mut Multipart) -> Result<ImageUpload, ApiError> {
    while let Some(field) = mp.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.into());
        if !is_accepted_content_type(&content_type) {
            return Err(ApiError::BadRequest(format!(
                "unsupported content type {content_type}; expected an image"
            )));
        }
        let file_name = field.file_name().map(|s| s.to_string());
        let body = field.bytes().await?;
        if body.is_empty() {
            return Err(ApiError::BadRequest("uploaded file is empty".into()));
        }

        debug!(bytes = body.len(), %content_type, ?file_name, "image received");
        return Ok(ImageUpload {
            body,
            content_type,
            file_name,
        });
    }
    Err(ApiError::BadRequest(format!(
        "multipart field `{FILE_FIELD}` is required"
    )))
}

fn is_accepted_content_type(ct: &str) -> bool {
    let essence = ct
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence.starts_with("image/") || essence == FALLBACK_CONTENT_TYPE
}
