use anyhow::Context;
use serde::Deserialize;

const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;
const DEFAULT_VISION_ENDPOINT: &str = "https://vision.googleapis.com/v1/images:annotate";

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum OcrConfig {
    Tesseract {
        bin: String,
        languages: String,
    },
    GoogleVision {
        api_key: String,
        endpoint: String,
    },
    Sidecar {
        base_url: String,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub extraction_temperature: f32,
    pub recipe_temperature: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
    pub ocr: OcrConfig,
    pub llm: LlmConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup so tests don't have to
    /// touch the process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| var(key).with_context(|| format!("{key} must be set"));

        let backend = var("OCR_BACKEND").unwrap_or_else(|| "tesseract".into());
        let ocr = match backend.trim().to_ascii_lowercase().as_str() {
            "tesseract" => OcrConfig::Tesseract {
                bin: var("TESSERACT_BIN").unwrap_or_else(|| "tesseract".into()),
                languages: var("OCR_LANGUAGES").unwrap_or_else(|| "kor+eng".into()),
            },
            "google_vision" => OcrConfig::GoogleVision {
                api_key: required("GOOGLE_VISION_API_KEY")?,
                endpoint: var("GOOGLE_VISION_ENDPOINT")
                    .unwrap_or_else(|| DEFAULT_VISION_ENDPOINT.into()),
            },
            "sidecar" => OcrConfig::Sidecar {
                base_url: required("OCR_SIDECAR_URL")?
                    .trim_end_matches('/')
                    .to_string(),
            },
            other => anyhow::bail!(
                "unknown OCR_BACKEND {other:?}; expected tesseract, google_vision or sidecar"
            ),
        };

        let llm = LlmConfig {
            api_key: required("OPENAI_API_KEY")?,
            base_url: var("OPENAI_BASE_URL")
                .unwrap_or_else(|| "https://api.openai.com/v1".into())
                .trim_end_matches('/')
                .to_string(),
            model: var("OPENAI_MODEL").unwrap_or_else(|| "gpt-4".into()),
            extraction_temperature: var("EXTRACTION_TEMPERATURE")
                .and_then(|v| v.parse::<f32>().ok())
                .unwrap_or(0.2),
            recipe_temperature: var("RECIPE_TEMPERATURE")
                .and_then(|v| v.parse::<f32>().ok())
                .unwrap_or(0.7),
        };

        let max_upload_bytes = var("MAX_UPLOAD_BYTES")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);

        Ok(Self {
            host: var("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: var("APP_PORT")
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(8080),
            max_upload_bytes,
            ocr,
            llm,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_to_tesseract_with_korean_and_english() {
        let cfg = AppConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-test")])).unwrap();
        assert_eq!(
            cfg.ocr,
            OcrConfig::Tesseract {
                bin: "tesseract".into(),
                languages: "kor+eng".into(),
            }
        );
        assert_eq!(cfg.llm.model, "gpt-4");
        assert_eq!(cfg.llm.base_url, "https://api.openai.com/v1");
        assert!((cfg.llm.extraction_temperature - 0.2).abs() < f32::EPSILON);
        assert!((cfg.llm.recipe_temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(cfg.max_upload_bytes, 20 * 1024 * 1024);
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 8080);
    }

    #[test]
    fn missing_openai_key_is_an_error() {
        let err = AppConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn blank_values_count_as_missing() {
        let err = AppConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "  ")])).unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn google_vision_requires_api_key() {
        let err = AppConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OCR_BACKEND", "google_vision"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("GOOGLE_VISION_API_KEY"));

        let cfg = AppConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OCR_BACKEND", "GOOGLE_VISION"),
            ("GOOGLE_VISION_API_KEY", "vision-key"),
        ]))
        .unwrap();
        assert_eq!(
            cfg.ocr,
            OcrConfig::GoogleVision {
                api_key: "vision-key".into(),
                endpoint: DEFAULT_VISION_ENDPOINT.into(),
            }
        );
    }

    #[test]
    fn sidecar_url_is_normalized() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OCR_BACKEND", "sidecar"),
            ("OCR_SIDECAR_URL", "http://localhost:8866/"),
            ("OPENAI_BASE_URL", "https://openrouter.ai/api/v1/"),
        ]))
        .unwrap();
        assert_eq!(
            cfg.ocr,
            OcrConfig::Sidecar {
                base_url: "http://localhost:8866".into(),
            }
        );
        assert_eq!(cfg.llm.base_url, "https://openrouter.ai/api/v1");
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let err = AppConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OCR_BACKEND", "easyocr"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("unknown OCR_BACKEND"));
    }

    #[test]
    fn unparseable_numbers_fall_back_to_defaults() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("EXTRACTION_TEMPERATURE", "cold"),
            ("MAX_UPLOAD_BYTES", "lots"),
            ("RECIPE_TEMPERATURE", "0.9"),
            ("APP_PORT", "http"),
        ]))
        .unwrap();
        assert!((cfg.llm.extraction_temperature - 0.2).abs() < f32::EPSILON);
        assert!((cfg.llm.recipe_temperature - 0.9).abs() < f32::EPSILON);
        assert_eq!(cfg.max_upload_bytes, 20 * 1024 * 1024);
        assert_eq!(cfg.port, 8080);
    }
}
