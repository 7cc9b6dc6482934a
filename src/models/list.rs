use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::MediaKind;

/// One saved title on a user's watchlist
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchlistItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub tmdb_id: i64,
    pub media_kind: MediaKind,
    pub title: String,
    pub poster_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A user-curated list of titles
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct List {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One title inside a curated list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListItem {
    pub id: Uuid,
    pub list_id: Uuid,
    pub tmdb_id: i64,
    pub media_kind: MediaKind,
    pub title: String,
    pub poster_url: Option<String>,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

/// A list together with its items, for display
#[derive(Debug, Clone, Serialize)]
pub struct ListWithItems {
    #[serde(flatten)]
    pub list: List,
    pub items: Vec<ListItem>,
}

/// Submission for a saved title (watchlist or list item)
#[derive(Debug, Clone, Deserialize)]
pub struct SavedTitleInput {
    pub tmdb_id: i64,
    pub media_kind: MediaKind,
    pub title: String,
    #[serde(default)]
    pub poster_url: Option<String>,
}

impl SavedTitleInput {
    pub fn validate(&self) -> AppResult<()> {
        if self.title.trim().is_empty() {
            return Err(AppError::InvalidInput("Title cannot be empty".to_string()));
        }
        Ok(())
    }
}

/// Submission for creating a curated list
#[derive(Debug, Clone, Deserialize)]
pub struct ListInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl ListInput {
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "List name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}
