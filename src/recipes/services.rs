use tracing::debug;

use super::{dto::UserProfile, prompt};
use crate::{error::ApiError, llm::CompletionRequest, state::AppState};

/// Prompt → completion. The reply is returned as free text.
pub async fn generate_recipe(st: &AppState, profile: &UserProfile) -> Result<String, ApiError> {
    let request = CompletionRequest::new(
        prompt::recipe_prompt(profile),
        st.config.llm.recipe_temperature,
    )
    .with_system(prompt::RECIPE_SYSTEM);
    let recipe = st.llm.complete(request).await?;
    debug!(chars = recipe.chars().count(), "recipe generated");
    Ok(recipe)
}
