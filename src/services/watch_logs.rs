//! Watch log CRUD.
//!
//! Rows are stored with plain text columns for the enum fields and coerced
//! into the typed model in one place, [`WatchLogRow::into_model`]. Writes
//! are always scoped to the owning user; reads of someone else's history go
//! through the friendship gate.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    CategoryRatings, Companionship, DiscoverySource, MediaKind, Platform, RewatchLikelihood,
    TimesWatched, WatchLogEntry, WatchLogInput,
};
use crate::services::friends;
use crate::state::Session;

#[derive(Debug, sqlx::FromRow)]
struct WatchLogRow {
    id: Uuid,
    user_id: Uuid,
    tmdb_id: Option<i64>,
    title: String,
    media_kind: String,
    rating: f32,
    review: Option<String>,
    watched_on: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    plot_rating: Option<i16>,
    cinematography_rating: Option<i16>,
    acting_rating: Option<i16>,
    soundtrack_rating: Option<i16>,
    pacing_rating: Option<i16>,
    casting_rating: Option<i16>,
    platform: Option<String>,
    discovered_via: Option<String>,
    rewatch_likelihood: Option<String>,
    watched_with: Option<String>,
    times_watched: Option<String>,
    poster_url: Option<String>,
}

impl WatchLogRow {
    fn into_model(self) -> AppResult<WatchLogEntry> {
        let media_kind = MediaKind::parse(&self.media_kind)
            .ok_or_else(|| AppError::Internal(format!("Unknown media kind: {}", self.media_kind)))?;

        // Unknown stored values for the optional enums coerce to "unset"
        // rather than failing the whole read.
        Ok(WatchLogEntry {
            id: self.id,
            user_id: self.user_id,
            tmdb_id: self.tmdb_id,
            title: self.title,
            media_kind,
            rating: self.rating,
            review: self.review,
            watched_on: self.watched_on,
            created_at: self.created_at,
            category_ratings: CategoryRatings {
                plot: self.plot_rating,
                cinematography: self.cinematography_rating,
                acting: self.acting_rating,
                soundtrack: self.soundtrack_rating,
                pacing: self.pacing_rating,
                casting: self.casting_rating,
            },
            platform: self.platform.as_deref().and_then(Platform::parse),
            discovered_via: self.discovered_via.as_deref().and_then(DiscoverySource::parse),
            rewatch_likelihood: self
                .rewatch_likelihood
                .as_deref()
                .and_then(RewatchLikelihood::parse),
            watched_with: self.watched_with.as_deref().and_then(Companionship::parse),
            times_watched: self.times_watched.as_deref().and_then(TimesWatched::parse),
            poster_url: self.poster_url,
        })
    }
}

const SELECT_COLUMNS: &str = "id, user_id, tmdb_id, title, media_kind, rating, review, watched_on, \
     created_at, plot_rating, cinematography_rating, acting_rating, soundtrack_rating, \
     pacing_rating, casting_rating, platform, discovered_via, rewatch_likelihood, watched_with, \
     times_watched, poster_url";

/// A user's full watch history, newest log first. No visibility check;
/// callers gate first when the reader is not the owner.
pub async fn logs_for_user(pool: &PgPool, user_id: Uuid) -> AppResult<Vec<WatchLogEntry>> {
    let rows = sqlx::query_as::<_, WatchLogRow>(&format!(
        "SELECT {} FROM watch_logs WHERE user_id = $1 ORDER BY created_at DESC",
        SELECT_COLUMNS
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(WatchLogRow::into_model).collect()
}

/// A user's watch history as seen by `session`: the owner sees everything,
/// friends see everything, everyone else gets a 403.
pub async fn logs_for_viewer(
    pool: &PgPool,
    session: &Session,
    owner_id: Uuid,
) -> AppResult<Vec<WatchLogEntry>> {
    friends::require_view_access(pool, session, owner_id).await?;
    logs_for_user(pool, owner_id).await
}

/// Creates a log owned by the session user. Validation runs before any I/O.
pub async fn create_log(
    pool: &PgPool,
    session: &Session,
    input: WatchLogInput,
) -> AppResult<WatchLogEntry> {
    input.validate()?;

    let entry = WatchLogEntry {
        id: Uuid::new_v4(),
        user_id: session.user_id,
        tmdb_id: input.tmdb_id,
        title: input.title,
        media_kind: input.media_kind,
        rating: input.rating,
        review: input.review,
        watched_on: input.watched_on,
        created_at: Utc::now(),
        category_ratings: input.category_ratings,
        platform: input.platform,
        discovered_via: input.discovered_via,
        rewatch_likelihood: input.rewatch_likelihood,
        watched_with: input.watched_with,
        times_watched: input.times_watched,
        poster_url: input.poster_url,
    };

    sqlx::query(
        "INSERT INTO watch_logs (id, user_id, tmdb_id, title, media_kind, rating, review, \
         watched_on, created_at, plot_rating, cinematography_rating, acting_rating, \
         soundtrack_rating, pacing_rating, casting_rating, platform, discovered_via, \
         rewatch_likelihood, watched_with, times_watched, poster_url) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, \
         $18, $19, $20, $21)",
    )
    .bind(entry.id)
    .bind(entry.user_id)
    .bind(entry.tmdb_id)
    .bind(&entry.title)
    .bind(entry.media_kind.as_str())
    .bind(entry.rating)
    .bind(&entry.review)
    .bind(entry.watched_on)
    .bind(entry.created_at)
    .bind(entry.category_ratings.plot)
    .bind(entry.category_ratings.cinematography)
    .bind(entry.category_ratings.acting)
    .bind(entry.category_ratings.soundtrack)
    .bind(entry.category_ratings.pacing)
    .bind(entry.category_ratings.casting)
    .bind(entry.platform.map(|p| p.as_str()))
    .bind(entry.discovered_via.map(|d| d.as_str()))
    .bind(entry.rewatch_likelihood.map(|r| r.as_str()))
    .bind(entry.watched_with.map(|w| w.as_str()))
    .bind(entry.times_watched.map(|t| t.as_str()))
    .bind(&entry.poster_url)
    .execute(pool)
    .await?;

    tracing::info!(log_id = %entry.id, user_id = %session.user_id, "Watch log created");
    Ok(entry)
}

/// Re-submits all fields of an existing log. Only the owner's rows match,
/// so editing someone else's log reads as not-found.
pub async fn update_log(
    pool: &PgPool,
    session: &Session,
    log_id: Uuid,
    input: WatchLogInput,
) -> AppResult<WatchLogEntry> {
    input.validate()?;

    let result = sqlx::query(
        "UPDATE watch_logs SET tmdb_id = $3, title = $4, media_kind = $5, rating = $6, \
         review = $7, watched_on = $8, plot_rating = $9, cinematography_rating = $10, \
         acting_rating = $11, soundtrack_rating = $12, pacing_rating = $13, casting_rating = $14, \
         platform = $15, discovered_via = $16, rewatch_likelihood = $17, watched_with = $18, \
         times_watched = $19, poster_url = $20 \
         WHERE id = $1 AND user_id = $2",
    )
    .bind(log_id)
    .bind(session.user_id)
    .bind(input.tmdb_id)
    .bind(&input.title)
    .bind(input.media_kind.as_str())
    .bind(input.rating)
    .bind(&input.review)
    .bind(input.watched_on)
    .bind(input.category_ratings.plot)
    .bind(input.category_ratings.cinematography)
    .bind(input.category_ratings.acting)
    .bind(input.category_ratings.soundtrack)
    .bind(input.category_ratings.pacing)
    .bind(input.category_ratings.casting)
    .bind(input.platform.map(|p| p.as_str()))
    .bind(input.discovered_via.map(|d| d.as_str()))
    .bind(input.rewatch_likelihood.map(|r| r.as_str()))
    .bind(input.watched_with.map(|w| w.as_str()))
    .bind(input.times_watched.map(|t| t.as_str()))
    .bind(&input.poster_url)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Watch log not found".to_string()));
    }

    let row = sqlx::query_as::<_, WatchLogRow>(&format!(
        "SELECT {} FROM watch_logs WHERE id = $1",
        SELECT_COLUMNS
    ))
    .bind(log_id)
    .fetch_one(pool)
    .await?;

    tracing::info!(log_id = %log_id, user_id = %session.user_id, "Watch log updated");
    row.into_model()
}

/// Deletes a log owned by the session user.
pub async fn delete_log(pool: &PgPool, session: &Session, log_id: Uuid) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM watch_logs WHERE id = $1 AND user_id = $2")
        .bind(log_id)
        .bind(session.user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Watch log not found".to_string()));
    }

    tracing::info!(log_id = %log_id, user_id = %session.user_id, "Watch log deleted");
    Ok(())
}
