//! Watchlist and custom lists.
//!
//! Both surfaces share the same duplicate policy: adding a title that is
//! already present is a no-op, enforced by unique indexes rather than a
//! read-before-write.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{List, ListInput, ListItem, ListWithItems, SavedTitleInput, WatchlistItem};
use crate::services::friends;
use crate::state::Session;

#[derive(Debug, sqlx::FromRow)]
struct WatchlistRow {
    id: Uuid,
    user_id: Uuid,
    tmdb_id: i64,
    title: String,
    media_kind: String,
    poster_url: Option<String>,
    created_at: chrono::DateTime<Utc>,
}

impl WatchlistRow {
    fn into_model(self) -> AppResult<WatchlistItem> {
        let media_kind = crate::models::MediaKind::parse(&self.media_kind)
            .ok_or_else(|| AppError::Internal(format!("Unknown media kind: {}", self.media_kind)))?;
        Ok(WatchlistItem {
            id: self.id,
            user_id: self.user_id,
            tmdb_id: self.tmdb_id,
            title: self.title,
            media_kind,
            poster_url: self.poster_url,
            created_at: self.created_at,
        })
    }
}

/// A user's watchlist, newest addition first. Gated for non-owners.
pub async fn watchlist_for_viewer(
    pool: &PgPool,
    session: &Session,
    owner_id: Uuid,
) -> AppResult<Vec<WatchlistItem>> {
    friends::require_view_access(pool, session, owner_id).await?;

    let rows = sqlx::query_as::<_, WatchlistRow>(
        "SELECT id, user_id, tmdb_id, title, media_kind, poster_url, created_at \
         FROM watchlist WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(owner_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(WatchlistRow::into_model).collect()
}

/// Saves a title to the session user's watchlist. Saving a title that is
/// already there succeeds without changing anything.
pub async fn add_to_watchlist(
    pool: &PgPool,
    session: &Session,
    input: SavedTitleInput,
) -> AppResult<()> {
    input.validate()?;

    let result = sqlx::query(
        "INSERT INTO watchlist (id, user_id, tmdb_id, title, media_kind, poster_url, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(Uuid::new_v4())
    .bind(session.user_id)
    .bind(input.tmdb_id)
    .bind(&input.title)
    .bind(input.media_kind.as_str())
    .bind(&input.poster_url)
    .bind(Utc::now())
    .execute(pool)
    .await;

    match result.map_err(AppError::from) {
        Ok(_) => {
            tracing::info!(user_id = %session.user_id, tmdb_id = input.tmdb_id, "Title saved to watchlist");
            Ok(())
        }
        Err(e) if e.is_unique_violation() => {
            tracing::debug!(user_id = %session.user_id, tmdb_id = input.tmdb_id, "Title already on watchlist");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Removes a title from the session user's watchlist by TMDB id.
pub async fn remove_from_watchlist(
    pool: &PgPool,
    session: &Session,
    tmdb_id: i64,
) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM watchlist WHERE user_id = $1 AND tmdb_id = $2")
        .bind(session.user_id)
        .bind(tmdb_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Title not on watchlist".to_string()));
    }
    Ok(())
}

#[derive(Debug, sqlx::FromRow)]
struct ListRow {
    id: Uuid,
    user_id: Uuid,
    name: String,
    description: Option<String>,
    created_at: chrono::DateTime<Utc>,
}

impl ListRow {
    fn into_model(self) -> List {
        List {
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            description: self.description,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ListItemRow {
    id: Uuid,
    list_id: Uuid,
    tmdb_id: i64,
    title: String,
    media_kind: String,
    poster_url: Option<String>,
    position: i32,
    created_at: chrono::DateTime<Utc>,
}

impl ListItemRow {
    fn into_model(self) -> AppResult<ListItem> {
        let media_kind = crate::models::MediaKind::parse(&self.media_kind)
            .ok_or_else(|| AppError::Internal(format!("Unknown media kind: {}", self.media_kind)))?;
        Ok(ListItem {
            id: self.id,
            list_id: self.list_id,
            tmdb_id: self.tmdb_id,
            title: self.title,
            media_kind,
            poster_url: self.poster_url,
            position: self.position,
            created_at: self.created_at,
        })
    }
}

/// A user's lists without their items, newest first. Gated for non-owners.
pub async fn lists_for_viewer(
    pool: &PgPool,
    session: &Session,
    owner_id: Uuid,
) -> AppResult<Vec<List>> {
    friends::require_view_access(pool, session, owner_id).await?;

    let rows = sqlx::query_as::<_, ListRow>(
        "SELECT id, user_id, name, description, created_at \
         FROM lists WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(owner_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(ListRow::into_model).collect())
}

/// A single list with its items, gated by the owner's relationship to the
/// session user.
pub async fn list_with_items(
    pool: &PgPool,
    session: &Session,
    list_id: Uuid,
) -> AppResult<ListWithItems> {
    let row = sqlx::query_as::<_, ListRow>(
        "SELECT id, user_id, name, description, created_at FROM lists WHERE id = $1",
    )
    .bind(list_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("List not found".to_string()))?;

    friends::require_view_access(pool, session, row.user_id).await?;

    let item_rows = sqlx::query_as::<_, ListItemRow>(
        "SELECT id, list_id, tmdb_id, title, media_kind, poster_url, position, created_at \
         FROM list_items WHERE list_id = $1 ORDER BY position ASC, created_at ASC",
    )
    .bind(list_id)
    .fetch_all(pool)
    .await?;

    let items = item_rows
        .into_iter()
        .map(ListItemRow::into_model)
        .collect::<AppResult<Vec<_>>>()?;

    Ok(ListWithItems {
        list: row.into_model(),
        items,
    })
}

/// Creates an empty list owned by the session user.
pub async fn create_list(pool: &PgPool, session: &Session, input: ListInput) -> AppResult<List> {
    input.validate()?;

    let list = List {
        id: Uuid::new_v4(),
        user_id: session.user_id,
        name: input.name,
        description: input.description,
        created_at: Utc::now(),
    };

    sqlx::query(
        "INSERT INTO lists (id, user_id, name, description, created_at) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(list.id)
    .bind(list.user_id)
    .bind(&list.name)
    .bind(&list.description)
    .bind(list.created_at)
    .execute(pool)
    .await?;

    tracing::info!(list_id = %list.id, user_id = %session.user_id, "List created");
    Ok(list)
}

/// Deletes a list and its items. Only the owner's lists match.
pub async fn delete_list(pool: &PgPool, session: &Session, list_id: Uuid) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM lists WHERE id = $1 AND user_id = $2")
        .bind(list_id)
        .bind(session.user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("List not found".to_string()));
    }

    tracing::info!(list_id = %list_id, user_id = %session.user_id, "List deleted");
    Ok(())
}

async fn owned_list(pool: &PgPool, session: &Session, list_id: Uuid) -> AppResult<()> {
    let owner: Option<(Uuid,)> = sqlx::query_as("SELECT user_id FROM lists WHERE id = $1")
        .bind(list_id)
        .fetch_optional(pool)
        .await?;

    match owner {
        None => Err(AppError::NotFound("List not found".to_string())),
        Some((user_id,)) if user_id != session.user_id => {
            Err(AppError::Forbidden("Not your list".to_string()))
        }
        Some(_) => Ok(()),
    }
}

/// Adds a title to one of the session user's lists; duplicates are no-ops.
pub async fn add_list_item(
    pool: &PgPool,
    session: &Session,
    list_id: Uuid,
    input: SavedTitleInput,
) -> AppResult<()> {
    input.validate()?;
    owned_list(pool, session, list_id).await?;

    // New items append to the end of the list.
    let result = sqlx::query(
        "INSERT INTO list_items (id, list_id, tmdb_id, title, media_kind, poster_url, position, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, \
         (SELECT COALESCE(MAX(position) + 1, 0) FROM list_items WHERE list_id = $2), $7)",
    )
    .bind(Uuid::new_v4())
    .bind(list_id)
    .bind(input.tmdb_id)
    .bind(&input.title)
    .bind(input.media_kind.as_str())
    .bind(&input.poster_url)
    .bind(Utc::now())
    .execute(pool)
    .await;

    match result.map_err(AppError::from) {
        Ok(_) => Ok(()),
        Err(e) if e.is_unique_violation() => {
            tracing::debug!(list_id = %list_id, tmdb_id = input.tmdb_id, "Title already on list");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Removes a title from one of the session user's lists by TMDB id.
pub async fn remove_list_item(
    pool: &PgPool,
    session: &Session,
    list_id: Uuid,
    tmdb_id: i64,
) -> AppResult<()> {
    owned_list(pool, session, list_id).await?;

    let result = sqlx::query("DELETE FROM list_items WHERE list_id = $1 AND tmdb_id = $2")
        .bind(list_id)
        .bind(tmdb_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Title not on list".to_string()));
    }
    Ok(())
}
