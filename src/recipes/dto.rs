use serde::{Deserialize, Serialize};

use crate::inbody::dto::InBodyMetrics;

pub const UNSPECIFIED_GENDER: &str = "unspecified";

/// Body of `POST /generate_recipe`. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub inbody: InBodyMetrics,
    /// Ingredient names the user does not want, as typed by the client.
    #[serde(default)]
    pub no_food: Vec<String>,
    /// Goal tags in the order the client sent them.
    #[serde(default)]
    pub purpose: Vec<String>,
}

impl UserProfile {
    pub fn gender(&self) -> &str {
        self.gender
            .as_deref()
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .unwrap_or(UNSPECIFIED_GENDER)
    }
}

#[derive(Debug, Serialize)]
pub struct RecipeResponse {
    pub success: bool,
    pub recipe: String,
}
