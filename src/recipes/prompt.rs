use super::dto::UserProfile;

pub const RECIPE_SYSTEM: &str =
    "당신은 체성분 데이터를 바탕으로 건강한 샐러드 식단을 설계하는 스포츠 영양사입니다.";

/// The only ingredients recipes may use.
pub const ALLOWED_INGREDIENTS: [&str; 15] = [
    "chicken breast",
    "salmon",
    "tuna",
    "tofu",
    "boiled egg",
    "chickpeas",
    "quinoa",
    "sweet potato",
    "avocado",
    "cherry tomato",
    "cucumber",
    "romaine lettuce",
    "spinach",
    "broccoli",
    "almonds",
];

const NONE: &str = "없음";

/// Builds the recipe instruction. Metrics are printed as sent and default to
/// `0.0`. Exclusions are echoed verbatim (blank entries and
/// repeats dropped) and removed from the allowed list when they name one of
/// its items; unknown exclusions have no other effect.
pub fn recipe_prompt(profile: &UserProfile) -> String {
    let metrics = profile.inbody;
    let excluded = excluded_foods(&profile.no_food);
    let goals: Vec<&str> = profile
        .purpose
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect();
    let quoted: Vec<String> = allowed_ingredients(&excluded)
        .iter()
        .map(|name| format!("\"{name}\""))
        .collect();
    let allowed: Vec<&str> = quoted.iter().map(String::as_str).collect();

    format!(
        "아래 사용자 정보를 참고해 샐러드 레시피 3가지를 추천해주세요.

사용자 정보:
- 성별: {gender}
- 체중: {weight}kg
- 골격근량: {muscle}kg
- 체지방량: {fat}kg
- 목표: {goals}
- 제외 재료: {excluded}

사용 가능한 재료 (아래 목록의 재료만 사용하세요):
{allowed}

각 레시피에는 이름, 재료와 분량(g), 조리 방법, 예상 칼로리(kcal)와 단백질(g)을 포함해주세요.",
        gender = profile.gender(),
        weight = figure(metrics.weight),
        muscle = figure(metrics.skeletal_muscle),
        fat = figure(metrics.body_fat),
        goals = list_or_none(&goals),
        excluded = list_or_none(&excluded),
        allowed = list_or_none(&allowed),
    )
}

// `{:?}` keeps every digit the client sent and always shows a decimal point.
fn figure(value: Option<f64>) -> String {
    format!("{:?}", value.unwrap_or(0.0))
}

fn excluded_foods(no_food: &[String]) -> Vec<&str> {
    let mut out: Vec<&str> = Vec::with_capacity(no_food.len());
    for food in no_food.iter().map(|f| f.trim()).filter(|f| !f.is_empty()) {
        if !out.contains(&food) {
            out.push(food);
        }
    }
    out
}

fn allowed_ingredients(excluded: &[&str]) -> Vec<&'static str> {
    ALLOWED_INGREDIENTS
        .iter()
        .copied()
        .filter(|item| !excluded.iter().any(|e| e.eq_ignore_ascii_case(item)))
        .collect()
}

fn list_or_none(items: &[&str]) -> String {
    if items.is_empty() {
        NONE.to_string()
    } else {
        items.join(", ")
    }
}
