use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::models::{MediaKind, PersonCredit, TitleCandidate, TmdbDetail, WatchProvider};
use crate::state::{AppState, Session};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    q: String,
}

fn parse_kind(kind: &str) -> AppResult<MediaKind> {
    MediaKind::parse(kind)
        .ok_or_else(|| AppError::InvalidInput(format!("Unknown media kind: {}", kind)))
}

/// Handler for title search
pub async fn search(
    State(state): State<AppState>,
    _session: Session,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Vec<TitleCandidate>>> {
    let candidates = state.provider.search_titles(&params.q).await?;
    Ok(Json(candidates))
}

/// Handler for title detail
pub async fn detail(
    State(state): State<AppState>,
    _session: Session,
    Path((kind, id)): Path<(String, i64)>,
) -> AppResult<Json<TmdbDetail>> {
    let kind = parse_kind(&kind)?;
    let detail = state.provider.fetch_detail(id, kind).await?;
    Ok(Json(detail))
}

/// Handler for streaming/rental/purchase offers
pub async fn watch_providers(
    State(state): State<AppState>,
    _session: Session,
    Path((kind, id)): Path<(String, i64)>,
) -> AppResult<Json<Vec<WatchProvider>>> {
    let kind = parse_kind(&kind)?;
    let providers = state.provider.fetch_watch_providers(id, kind).await?;
    Ok(Json(providers))
}

/// Handler for similar titles
pub async fn similar(
    State(state): State<AppState>,
    _session: Session,
    Path((kind, id)): Path<(String, i64)>,
) -> AppResult<Json<Vec<TitleCandidate>>> {
    let kind = parse_kind(&kind)?;
    let titles = state.provider.fetch_similar(id, kind).await?;
    Ok(Json(titles))
}

/// Handler for a person's filmography
pub async fn person_credits(
    State(state): State<AppState>,
    _session: Session,
    Path(person_id): Path<i64>,
) -> AppResult<Json<Vec<PersonCredit>>> {
    let credits = state.provider.fetch_person_credits(person_id).await?;
    Ok(Json(credits))
}
