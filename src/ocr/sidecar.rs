use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::{join_lines, OcrEngine, OcrError};
use crate::uploads::ImageUpload;

/// A separate OCR process (EasyOCR, PaddleOCR, ...) exposed over HTTP on the
/// same host. It keeps its own model loaded; we only ship bytes to it.
#[derive(Debug, Clone)]
pub struct SidecarOcr {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct OcrRequest {
    image_base64: String,
}

/// One detected line. The sidecar also sends a `bbox` whose coordinates may
/// be integers or floats depending on the engine; only the text is used.
#[derive(Debug, Deserialize)]
struct TextBox {
    text: String,
}

impl SidecarOcr {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl OcrEngine for SidecarOcr {
    fn name(&self) -> &'static str {
        "sidecar"
    }

    async fn extract_text(&self, image: &ImageUpload) -> Result<String, OcrError> {
        let payload = OcrRequest {
            image_base64: general_purpose::STANDARD.encode(&image.body),
        };
        let url = format!("{}/ocr_base64", self.base_url);

        let response = self.client.post(&url).json(&payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, %body, %url, "ocr sidecar error");
            return Err(OcrError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let boxes: Vec<TextBox> = response.json().await?;
        debug!(boxes = boxes.len(), "sidecar ocr done");
        Ok(join_lines(boxes.iter().map(|b| b.text.as_str())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_text_boxes_in_reading_order() {
        let boxes: Vec<TextBox> = serde_json::from_str(
            r#"[{"text":"체중","bbox":[[0,0],[10,0]]},{"text":"65.4kg","bbox":[]},{"text":"골격근량"}]"#,
        )
        .unwrap();
        let text = join_lines(boxes.iter().map(|b| b.text.as_str()));
        assert_eq!(text, "체중\n65.4kg\n골격근량");
    }

    #[test]
    fn float_bounding_boxes_decode() {
        let boxes: Vec<TextBox> = serde_json::from_str(
            r#"[{"text":"체중 65.4kg","bbox":[[10.5,4.0],[88.25,4.0],[88.25,19.75],[10.5,19.75]]},{"text":"골격근량 28.2kg","bbox":[[10,24],[90,24],[90,40],[10,40]]}]"#,
        )
        .unwrap();
        let text = join_lines(boxes.iter().map(|b| b.text.as_str()));
        assert_eq!(text, "체중 65.4kg\n골격근량 28.2kg");
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let ocr = SidecarOcr::new(reqwest::Client::new(), "http://127.0.0.1:8866/");
        assert_eq!(ocr.base_url, "http://127.0.0.1:8866");
    }
}
