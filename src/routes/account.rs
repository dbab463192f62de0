use axum::{extract::State, Json};

use super::AppState;
use crate::{
    auth::CurrentSession,
    error::AppResult,
    views::account::{account_view, AccountView},
};

/// Dashboard with profile, library and stats
pub async fn dashboard(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> AppResult<Json<AccountView>> {
    let user_id = session.user_id();

    let (watchlist, reviews, lists) = tokio::try_join!(
        state.store.watchlist(user_id),
        state.store.reviews_by_user(user_id),
        state.lists.lists(user_id),
    )?;

    Ok(Json(account_view(&session, &watchlist, &reviews, lists)))
}
