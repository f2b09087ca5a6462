use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use super::{dto::InBodyMetrics, prompt};
use crate::{error::ApiError, llm::CompletionRequest, state::AppState, uploads::ImageUpload};

#[derive(Debug, Error, PartialEq)]
pub enum ReplyError {
    #[error("reply is not JSON: {0}")]
    NotJson(String),
    #[error("reply JSON is not an object")]
    NotObject,
    #[error("field `{field}` is not a number")]
    InvalidField { field: &'static str },
}

pub struct Extraction {
    pub raw_ocr: String,
    pub reply: String,
    pub metrics: InBodyMetrics,
}

pub async fn recognize(st: &AppState, image: &ImageUpload) -> Result<String, ApiError> {
    debug!(
        backend = st.ocr.name(),
        bytes = image.body.len(),
        content_type = %image.content_type,
        file_name = ?image.file_name,
        "running ocr"
    );
    let text = st.ocr.extract_text(image).await?;
    debug!(chars = text.chars().count(), "ocr finished");
    Ok(text)
}

/// OCR → prompt → completion → validated metrics.
pub async fn extract_inbody(st: &AppState, image: &ImageUpload) -> Result<Extraction, ApiError> {
    let raw_ocr = recognize(st, image).await?;
    if raw_ocr.is_empty() {
        warn!("ocr produced no text; asking the model anyway");
    }

    let request = CompletionRequest::new(
        prompt::extraction_prompt(&raw_ocr),
        st.config.llm.extraction_temperature,
    )
    .with_system(prompt::EXTRACTION_SYSTEM);
    let reply = st.llm.complete(request).await?;

    let metrics = match parse_metrics_reply(&reply) {
        Ok(m) => m,
        Err(source) => return Err(ApiError::InvalidReply { source, reply }),
    };
    if metrics.is_empty() {
        warn!("model reply contained no metrics");
    }

    Ok(Extraction {
        raw_ocr,
        reply,
        metrics,
    })
}

lazy_static! {
    static ref FENCED: Regex = Regex::new(r"(?s)```[A-Za-z]*\s*(.*?)```").unwrap();
    static ref NUMBER: Regex = Regex::new(r"-?\d+(?:[.,]\d+)*").unwrap();
}

/// Parses a model reply that is supposed to hold the three metrics as JSON.
/// Tolerates code fences, prose around the object and numbers written as
/// strings with units (`"65.4kg"`).
pub fn parse_metrics_reply(reply: &str) -> Result<InBodyMetrics, ReplyError> {
    let body = FENCED
        .captures(reply)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(reply);
    let candidate = match (body.find('{'), body.rfind('}')) {
        (Some(start), Some(end)) if start < end => &body[start..=end],
        _ => body.trim(),
    };

    let value: Value =
        serde_json::from_str(candidate).map_err(|e| ReplyError::NotJson(e.to_string()))?;
    let obj = value.as_object().ok_or(ReplyError::NotObject)?;

    Ok(InBodyMetrics {
        weight: field(obj, "weight", &["weight"])?,
        body_fat: field(obj, "bodyFat", &["bodyFat", "body_fat"])?,
        skeletal_muscle: field(obj, "skeletalMuscle", &["skeletalMuscle", "skeletal_muscle"])?,
    })
}

fn field(
    obj: &Map<String, Value>,
    name: &'static str,
    keys: &[&str],
) -> Result<Option<f64>, ReplyError> {
    let value = keys.iter().find_map(|k| obj.get(*k));
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(Some)
            .ok_or(ReplyError::InvalidField { field: name }),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => parse_number(s)
            .map(Some)
            .ok_or(ReplyError::InvalidField { field: name }),
        Some(_) => Err(ReplyError::InvalidField { field: name }),
    }
}

/// A lone comma is a decimal separator (`12,7`); next to a dot, commas group
/// thousands (`1,234.5`).
fn parse_number(s: &str) -> Option<f64> {
    let raw = NUMBER.find(s)?.as_str();
    let normalized = if raw.contains('.') {
        raw.replace(',', "")
    } else {
        raw.replacen(',', ".", 1)
    };
    normalized.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_json() {
        let m = parse_metrics_reply(r#"{"weight": 65.4, "bodyFat": 12.7, "skeletalMuscle": 28.2}"#)
            .unwrap();
        assert_eq!(
            m,
            InBodyMetrics {
                weight: Some(65.4),
                body_fat: Some(12.7),
                skeletal_muscle: Some(28.2),
            }
        );
    }

    #[test]
    fn parses_fenced_json_with_prose() {
        let reply = "추출 결과입니다.\n```json\n{\n  \"weight\": 65.4,\n  \"bodyFat\": 12.7,\n  \"skeletalMuscle\": 28.2\n}\n```\n참고하세요.";
        let m = parse_metrics_reply(reply).unwrap();
        assert_eq!(m.weight, Some(65.4));
        assert_eq!(m.body_fat, Some(12.7));
        assert_eq!(m.skeletal_muscle, Some(28.2));
    }

    #[test]
    fn accepts_numbers_written_as_strings() {
        let m = parse_metrics_reply(
            r#"{"weight": "65.4kg", "body_fat": "12,7 kg", "skeletalMuscle": "28.2"}"#,
        )
        .unwrap();
        assert_eq!(m.weight, Some(65.4));
        assert_eq!(m.body_fat, Some(12.7));
        assert_eq!(m.skeletal_muscle, Some(28.2));
    }

    #[test]
    fn comma_is_decimal_unless_a_dot_follows() {
        assert_eq!(parse_number("12,7 kg"), Some(12.7));
        assert_eq!(parse_number("1,234.5"), Some(1234.5));
        assert_eq!(parse_number("약 65.4kg"), Some(65.4));
        assert_eq!(parse_number("-3"), Some(-3.0));
        assert_eq!(parse_number("kg"), None);
    }

    #[test]
    fn missing_and_null_fields_are_unset() {
        let m = parse_metrics_reply(r#"{"weight": 70, "bodyFat": null}"#).unwrap();
        assert_eq!(m.weight, Some(70.0));
        assert_eq!(m.body_fat, None);
        assert_eq!(m.skeletal_muscle, None);
        assert!(parse_metrics_reply("{}").unwrap().is_empty());
    }

    #[test]
    fn rejects_non_json_reply() {
        let err = parse_metrics_reply("죄송합니다. 이미지에서 수치를 찾을 수 없습니다.").unwrap_err();
        assert!(matches!(err, ReplyError::NotJson(_)));

        let err = parse_metrics_reply(r#"{"weight": ..., "bodyFat": ...}"#).unwrap_err();
        assert!(matches!(err, ReplyError::NotJson(_)));

        assert!(matches!(parse_metrics_reply(""), Err(ReplyError::NotJson(_))));
    }

    #[test]
    fn rejects_non_object_json() {
        assert_eq!(parse_metrics_reply("[65.4, 12.7]"), Err(ReplyError::NotObject));
        assert_eq!(parse_metrics_reply("65.4"), Err(ReplyError::NotObject));
    }

    #[test]
    fn rejects_non_numeric_fields() {
        assert_eq!(
            parse_metrics_reply(r#"{"weight": true}"#),
            Err(ReplyError::InvalidField { field: "weight" })
        );
        assert_eq!(
            parse_metrics_reply(r#"{"skeletalMuscle": "unknown"}"#),
            Err(ReplyError::InvalidField {
                field: "skeletalMuscle"
            })
        );
    }
}
