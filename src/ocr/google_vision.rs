use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::{OcrEngine, OcrError};
use crate::uploads::ImageUpload;

/// Google Cloud Vision `images:annotate` with TEXT_DETECTION.
#[derive(Debug, Clone)]
pub struct GoogleVisionOcr {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

#[derive(Debug, Serialize)]
struct AnnotateRequest<'a> {
    requests: Vec<AnnotateImageRequest<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageRequest<'a> {
    image: ImageContent,
    features: Vec<Feature>,
    image_context: ImageContext<'a>,
}

#[derive(Debug, Serialize)]
struct ImageContent {
    content: String,
}

#[derive(Debug, Serialize)]
struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageContext<'a> {
    language_hints: &'a [&'a str],
}

#[derive(Debug, Default, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    full_text_annotation: Option<TextAnnotation>,
    #[serde(default)]
    text_annotations: Vec<EntityAnnotation>,
    error: Option<Status>,
}

#[derive(Debug, Deserialize)]
struct TextAnnotation {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct EntityAnnotation {
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct Status {
    #[serde(default)]
    message: String,
}

const LANGUAGE_HINTS: &[&str] = &["ko", "en"];

impl GoogleVisionOcr {
    pub fn new(client: reqwest::Client, api_key: &str, endpoint: &str) -> Self {
        Self {
            client,
            api_key: api_key.to_string(),
            endpoint: endpoint.to_string(),
        }
    }
}

#[async_trait]
impl OcrEngine for GoogleVisionOcr {
    fn name(&self) -> &'static str {
        "google_vision"
    }

    async fn extract_text(&self, image: &ImageUpload) -> Result<String, OcrError> {
        let request = AnnotateRequest {
            requests: vec![AnnotateImageRequest {
                image: ImageContent {
                    content: general_purpose::STANDARD.encode(&image.body),
                },
                features: vec![Feature {
                    kind: "TEXT_DETECTION",
                }],
                image_context: ImageContext {
                    language_hints: LANGUAGE_HINTS,
                },
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", &self.api_key)])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, %body, "vision api error");
            return Err(OcrError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let annotated: AnnotateResponse = response.json().await?;
        let text = text_from_response(annotated)?;
        debug!(bytes = image.body.len(), chars = text.chars().count(), "vision ocr done");
        Ok(text)
    }
}

fn text_from_response(response: AnnotateResponse) -> Result<String, OcrError> {
    let Some(first) = response.responses.into_iter().next() else {
        return Ok(String::new());
    };
    if let Some(err) = first.error {
        return Err(OcrError::Engine(err.message));
    }
    let text = first
        .full_text_annotation
        .map(|a| a.text)
        .or_else(|| first.text_annotations.into_iter().next().map(|a| a.description))
        .unwrap_or_default();
    Ok(super::join_lines(text.lines()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> AnnotateResponse {
        serde_json::from_str(json).expect("valid response json")
    }

    #[test]
    fn prefers_full_text_annotation() {
        let resp = parse(
            r#"{"responses":[{
                "fullTextAnnotation":{"text":"체중 65.4kg\n체지방량 12.7kg\n"},
                "textAnnotations":[{"description":"ignored"}]
            }]}"#,
        );
        assert_eq!(text_from_response(resp).unwrap(), "체중 65.4kg\n체지방량 12.7kg");
    }

    #[test]
    fn falls_back_to_first_text_annotation() {
        let resp = parse(r#"{"responses":[{"textAnnotations":[{"description":"InBody 570"},{"description":"InBody"}]}]}"#);
        assert_eq!(text_from_response(resp).unwrap(), "InBody 570");
    }

    #[test]
    fn empty_response_is_empty_text() {
        assert_eq!(text_from_response(parse(r#"{"responses":[{}]}"#)).unwrap(), "");
        assert_eq!(text_from_response(parse("{}")).unwrap(), "");
    }

    #[test]
    fn per_image_error_is_surfaced() {
        let resp = parse(r#"{"responses":[{"error":{"code":3,"message":"Bad image data."}}]}"#);
        let err = text_from_response(resp).unwrap_err();
        assert!(err.to_string().contains("Bad image data."));
    }

    #[test]
    fn request_uses_camel_case_and_language_hints() {
        let req = AnnotateRequest {
            requests: vec![AnnotateImageRequest {
                image: ImageContent {
                    content: "AAAA".into(),
                },
                features: vec![Feature {
                    kind: "TEXT_DETECTION",
                }],
                image_context: ImageContext {
                    language_hints: LANGUAGE_HINTS,
                },
            }],
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["requests"][0]["features"][0]["type"], "TEXT_DETECTION");
        assert_eq!(
            json["requests"][0]["imageContext"]["languageHints"],
            serde_json::json!(["ko", "en"])
        );
    }
}
