use axum::{
    extract::{Multipart, State},
    routing::post,
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    dto::{ExtractInbodyResponse, ExtractTextResponse},
    services,
};
use crate::{error::ApiError, state::AppState, uploads::read_image};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/extract_text", post(extract_text))
        .route("/extract_inbody", post(extract_inbody))
}

/// POST /extract_text (multipart, field `file`)
#[instrument(skip(state, mp), fields(request_id = %uuid::Uuid::new_v4()))]
pub async fn extract_text(
    State(state): State<AppState>,
    mut mp: Multipart,
) -> Result<Json<ExtractTextResponse>, ApiError> {
    let image = read_image(&mut mp).await?;
    let text = services::recognize(&state, &image).await?;
    Ok(Json(ExtractTextResponse { text }))
}

/// POST /extract_inbody (multipart, field `file`)
#[instrument(skip(state, mp), fields(request_id = %uuid::Uuid::new_v4()))]
pub async fn extract_inbody(
    State(state): State<AppState>,
    mut mp: Multipart,
) -> Result<Json<ExtractInbodyResponse>, ApiError> {
    let image = read_image(&mut mp).await?;
    let extraction = services::extract_inbody(&state, &image).await?;
    info!(metrics = ?extraction.metrics, "inbody extracted");
    Ok(Json(ExtractInbodyResponse {
        success: true,
        raw_ocr: extraction.raw_ocr,
        extracted: extraction.reply,
        data: extraction.metrics,
    }))
}
