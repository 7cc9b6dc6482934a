use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{WatchLogEntry, WatchLogInput};
use crate::services::watch_logs;
use crate::state::{AppState, Session};

/// Handler for creating a watch log
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    Json(input): Json<WatchLogInput>,
) -> AppResult<(StatusCode, Json<WatchLogEntry>)> {
    let entry = watch_logs::create_log(&state.db, &session, input).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// Handler for editing a watch log
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Path(log_id): Path<Uuid>,
    Json(input): Json<WatchLogInput>,
) -> AppResult<Json<WatchLogEntry>> {
    let entry = watch_logs::update_log(&state.db, &session, log_id, input).await?;
    Ok(Json(entry))
}

/// Handler for deleting a watch log
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Path(log_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    watch_logs::delete_log(&state.db, &session, log_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for a user's watch history; non-owners must be friends
pub async fn list_for_user(
    State(state): State<AppState>,
    session: Session,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<Vec<WatchLogEntry>>> {
    let entries = watch_logs::logs_for_viewer(&state.db, &session, user_id).await?;
    Ok(Json(entries))
}
