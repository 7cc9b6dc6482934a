use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::friends;
use crate::services::friends::FriendListEntry;
use crate::state::{AppState, Session};

/// Handler for the session user's friends and pending requests
pub async fn overview(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<Json<Vec<FriendListEntry>>> {
    let entries = friends::friends_overview(&state.db, &session).await?;
    Ok(Json(entries))
}

/// Handler for sending a friend request; re-sending is a no-op
pub async fn send_request(
    State(state): State<AppState>,
    session: Session,
    Path(user_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    friends::send_request(&state.db, &session, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for accepting a pending request sent by `user_id`
pub async fn accept_request(
    State(state): State<AppState>,
    session: Session,
    Path(user_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    friends::accept_request(&state.db, &session, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for removing whatever edge exists with `user_id`: cancels a sent
/// request, declines a received one, or unfriends
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Path(user_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    friends::remove_edge(&state.db, &session, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
