use crate::config::AppConfig;
use crate::llm::{LlmClient, OpenAiClient};
use crate::ocr::{self, OcrEngine};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub ocr: Arc<dyn OcrEngine>,
    pub llm: Arc<dyn LlmClient>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        // One pooled HTTP client for both the vision/sidecar OCR and the LLM.
        let http = reqwest::Client::new();
        let ocr = ocr::from_config(&config.ocr, http.clone()).await?;
        let llm = Arc::new(OpenAiClient::new(&config.llm, http)) as Arc<dyn LlmClient>;

        Ok(Self::from_parts(config, ocr, llm))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        ocr: Arc<dyn OcrEngine>,
        llm: Arc<dyn LlmClient>,
    ) -> Self {
        Self { config, ocr, llm }
    }
}

#[cfg(test)]
pub use fakes::{FakeOcr, RecordingLlm};
