use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::AnalyticsView;
use crate::services::analytics;
use crate::state::{AppState, Session};

/// Handler for a user's watch-history analytics.
///
/// Returns `null` when the user has no logs; the absence of data is a
/// distinct state from all-zero aggregates.
pub async fn for_user(
    State(state): State<AppState>,
    session: Session,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<Option<AnalyticsView>>> {
    let view = analytics::user_analytics(&state.db, state.provider.clone(), &session, user_id)
        .await?;
    Ok(Json(view))
}
