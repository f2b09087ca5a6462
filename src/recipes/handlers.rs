use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    dto::{RecipeResponse, UserProfile},
    services,
};
use crate::{error::ApiError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/generate_recipe", post(generate_recipe))
}

/// POST /generate_recipe { gender?, inbody?, noFood?, purpose? }
#[instrument(skip(state, payload), fields(request_id = %uuid::Uuid::new_v4()))]
pub async fn generate_recipe(
    State(state): State<AppState>,
    payload: Result<Json<UserProfile>, JsonRejection>,
) -> Result<Json<RecipeResponse>, ApiError> {
    let Json(profile) = payload?;
    info!(
        gender = profile.gender(),
        excluded = profile.no_food.len(),
        goals = profile.purpose.len(),
        "generating recipe"
    );
    let recipe = services::generate_recipe(&state, &profile).await?;
    Ok(Json(RecipeResponse {
        success: true,
        recipe,
    }))
}
