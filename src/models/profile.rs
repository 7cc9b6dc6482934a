use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::RelationshipState;

/// Public identity denormalized from the auth account so it can be
/// searched and joined without touching the auth system
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub user_id: Uuid,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub accent_color: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Fields submitted when a user syncs their own profile
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileInput {
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub accent_color: Option<String>,
}

impl ProfileInput {
    /// Usernames are 3-20 characters of lowercase ASCII letters, digits
    /// and underscores.
    pub fn validate(&self) -> AppResult<()> {
        let name = self.username.as_str();
        let valid_chars = name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if name.len() < 3 || name.len() > 20 || !valid_chars {
            return Err(AppError::InvalidInput(
                "Username must be 3-20 characters of a-z, 0-9 or _".to_string(),
            ));
        }
        Ok(())
    }
}

/// A profile search hit, annotated with the searcher's relationship to it
#[derive(Debug, Clone, Serialize)]
pub struct AnnotatedProfile {
    #[serde(flatten)]
    pub profile: Profile,
    pub relationship: RelationshipState,
}
