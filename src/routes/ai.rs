use axum::{extract::State, Json};

use super::AppState;
use crate::{
    auth::ClientSession,
    error::AppResult,
    models::{RecommendationRequest, TitleRef},
    services::RequestKind,
    views::ai::{ai_view, AiView},
};

/// Asks the model for one title and resolves it on the metadata provider
pub async fn recommend(
    State(state): State<AppState>,
    client: ClientSession,
    Json(request): Json<RecommendationRequest>,
) -> AppResult<Json<AiView>> {
    request.validate()?;

    let ticket = state
        .inflight
        .begin(client.client_id.0, RequestKind::Recommendation);

    let result = async {
        let reply = state.recommender.recommend(&request).await?;

        let details = match &reply.suggestion {
            Some(suggestion) => {
                let title = TitleRef {
                    media_type: suggestion.media_type,
                    tmdb_id: suggestion.tmdb_id,
                };
                match state.metadata.details(title).await {
                    Ok(details) => Some(details),
                    Err(e) => {
                        tracing::warn!(title = %title, error = %e, "Suggested title could not be resolved");
                        None
                    }
                }
            }
            None => None,
        };

        Ok(ai_view(reply, details.as_ref()))
    }
    .await;

    Ok(Json(ticket.finish(result)?))
}
