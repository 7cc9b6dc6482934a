use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{List, ListInput, ListWithItems, SavedTitleInput, WatchlistItem};
use crate::services::lists;
use crate::state::{AppState, Session};

/// Handler for a user's watchlist; non-owners must be friends
pub async fn watchlist_for_user(
    State(state): State<AppState>,
    session: Session,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<Vec<WatchlistItem>>> {
    let items = lists::watchlist_for_viewer(&state.db, &session, user_id).await?;
    Ok(Json(items))
}

/// Handler for saving a title to the session user's watchlist
pub async fn add_to_watchlist(
    State(state): State<AppState>,
    session: Session,
    Json(input): Json<SavedTitleInput>,
) -> AppResult<StatusCode> {
    lists::add_to_watchlist(&state.db, &session, input).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for removing a watchlist entry by TMDB id
pub async fn remove_from_watchlist(
    State(state): State<AppState>,
    session: Session,
    Path(tmdb_id): Path<i64>,
) -> AppResult<StatusCode> {
    lists::remove_from_watchlist(&state.db, &session, tmdb_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for a user's lists; non-owners must be friends
pub async fn lists_for_user(
    State(state): State<AppState>,
    session: Session,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<Vec<List>>> {
    let user_lists = lists::lists_for_viewer(&state.db, &session, user_id).await?;
    Ok(Json(user_lists))
}

/// Handler for one list with its items
pub async fn list_detail(
    State(state): State<AppState>,
    session: Session,
    Path(list_id): Path<Uuid>,
) -> AppResult<Json<ListWithItems>> {
    let list = lists::list_with_items(&state.db, &session, list_id).await?;
    Ok(Json(list))
}

/// Handler for creating a list
pub async fn create_list(
    State(state): State<AppState>,
    session: Session,
    Json(input): Json<ListInput>,
) -> AppResult<(StatusCode, Json<List>)> {
    let list = lists::create_list(&state.db, &session, input).await?;
    Ok((StatusCode::CREATED, Json(list)))
}

/// Handler for deleting a list
pub async fn delete_list(
    State(state): State<AppState>,
    session: Session,
    Path(list_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    lists::delete_list(&state.db, &session, list_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for adding a title to a list
pub async fn add_item(
    State(state): State<AppState>,
    session: Session,
    Path(list_id): Path<Uuid>,
    Json(input): Json<SavedTitleInput>,
) -> AppResult<StatusCode> {
    lists::add_list_item(&state.db, &session, list_id, input).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for removing a title from a list by TMDB id
pub async fn remove_item(
    State(state): State<AppState>,
    session: Session,
    Path((list_id, tmdb_id)): Path<(Uuid, i64)>,
) -> AppResult<StatusCode> {
    lists::remove_list_item(&state.db, &session, list_id, tmdb_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
