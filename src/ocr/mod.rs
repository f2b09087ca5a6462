use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use thiserror::Error;

use crate::{config::OcrConfig, uploads::ImageUpload};

mod google_vision;
mod sidecar;
mod tesseract;

pub use google_vision::GoogleVisionOcr;
pub use sidecar::SidecarOcr;
pub use tesseract::TesseractOcr;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR engine failed: {0}")]
    Engine(String),
    #[error("OCR service returned {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("OCR request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("OCR process I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Turns an uploaded image into plain text. Implementations are built once at
/// startup and shared read-only between requests.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Short backend name used in logs.
    fn name(&self) -> &'static str;

    /// Returns the recognized text, one line per detected text line. An image
    /// without text yields an empty string.
    async fn extract_text(&self, image: &ImageUpload) -> Result<String, OcrError>;
}

pub async fn from_config(
    config: &OcrConfig,
    http: reqwest::Client,
) -> anyhow::Result<Arc<dyn OcrEngine>> {
    let engine: Arc<dyn OcrEngine> = match config {
        OcrConfig::Tesseract { bin, languages } => Arc::new(
            TesseractOcr::load(bin, languages)
                .await
                .with_context(|| format!("load tesseract ({bin}, {languages})"))?,
        ),
        OcrConfig::GoogleVision { api_key, endpoint } => {
            Arc::new(GoogleVisionOcr::new(http, api_key, endpoint))
        }
        OcrConfig::Sidecar { base_url } => Arc::new(SidecarOcr::new(http, base_url)),
    };
    tracing::info!(backend = engine.name(), "ocr engine ready");
    Ok(engine)
}

/// Joins recognized lines the way every backend reports them: trimmed,
/// blank lines dropped, newline separated.
pub(crate) fn join_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> String {
    lines
        .into_iter()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
