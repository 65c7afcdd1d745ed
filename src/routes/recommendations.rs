use axum::{extract::State, Extension, Json};
use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::{Principal, RequestId},
    models::Recommendation,
    routes::AppState,
    services::recommendations,
};

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub recommended_books: Vec<Recommendation>,
}

/// Handler for recommendations endpoint
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Principal(user): Principal,
) -> AppResult<Json<RecommendationResponse>> {
    tracing::info!(
        request_id = %request_id,
        user_id = user.id,
        "Processing recommendation request"
    );

    let mut rng = match state.recommendation.candidate_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let recommended_books = recommendations::recommend(
        state.store.as_ref(),
        state.completion.as_ref(),
        &state.recommendation,
        &user,
        &mut rng,
    )
    .await?;

    tracing::info!(
        request_id = %request_id,
        count = recommended_books.len(),
        "Recommendation completed"
    );

    Ok(Json(RecommendationResponse { recommended_books }))
}
