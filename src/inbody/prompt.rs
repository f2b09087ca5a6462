pub const EXTRACTION_SYSTEM: &str =
    "당신은 헬스 트레이너이며, 인바디 검사 결과를 구조화된 데이터로 정리하는 전문가입니다.";

/// Wraps raw OCR text in the extraction instruction. The text is embedded
/// as-is; figures like `65.4kg` reach the model exactly as OCR produced them.
pub fn extraction_prompt(ocr_text: &str) -> String {
    format!(
        r#"다음 텍스트는 인바디 검사지에서 OCR로 추출한 결과입니다.
체중(kg), 체지방량(kg), 골격근량(kg) 세 가지 수치만 찾아 아래 JSON 형식으로만 응답해주세요.
값을 찾을 수 없으면 null을 넣고, 설명이나 다른 문장은 붙이지 마세요.

텍스트:
{ocr_text}

출력 형식:
{{
  "weight": 숫자,
  "bodyFat": 숫자,
  "skeletalMuscle": 숫자
}}"#
    )
}
