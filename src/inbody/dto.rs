use serde::{Deserialize, Serialize};

/// Body-composition figures in kilograms. `None` means the value was not
/// provided; no range checks or unit conversion are applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InBodyMetrics {
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub body_fat: Option<f64>,
    #[serde(default)]
    pub skeletal_muscle: Option<f64>,
}

impl InBodyMetrics {
    pub fn is_empty(&self) -> bool {
        self.weight.is_none() && self.body_fat.is_none() && self.skeletal_muscle.is_none()
    }
}

#[derive(Debug, Serialize)]
pub struct ExtractTextResponse {
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractInbodyResponse {
    pub success: bool,
    pub raw_ocr: String,
    pub extracted: String,
    pub data: InBodyMetrics,
}
