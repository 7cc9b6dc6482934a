use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::error::AppResult;
use crate::models::{AnnotatedProfile, Profile, ProfileInput};
use crate::services::profiles;
use crate::state::{AppState, Session};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    q: String,
}

/// Handler for syncing the session user's own profile
pub async fn upsert(
    State(state): State<AppState>,
    session: Session,
    Json(input): Json<ProfileInput>,
) -> AppResult<Json<Profile>> {
    let profile = profiles::upsert_profile(&state.db, &session, input).await?;
    Ok(Json(profile))
}

/// Handler for looking up a profile by username
pub async fn by_username(
    State(state): State<AppState>,
    session: Session,
    Path(username): Path<String>,
) -> AppResult<Json<AnnotatedProfile>> {
    let profile = profiles::profile_by_username(&state.db, &session, &username).await?;
    Ok(Json(profile))
}

/// Handler for profile search
pub async fn search(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Vec<AnnotatedProfile>>> {
    let hits = profiles::search_profiles(&state.db, &session, &params.q).await?;
    Ok(Json(hits))
}
