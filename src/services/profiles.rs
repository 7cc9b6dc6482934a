//! Public profiles.
//!
//! Profiles are write-through from the client after auth changes, keyed by
//! the auth user id. Search hits come back annotated with the searcher's
//! relationship to each account so the UI can render the right action
//! button without a second round trip.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{AnnotatedProfile, Profile, ProfileInput, RelationshipState};
use crate::services::friends;
use crate::state::Session;

const SEARCH_LIMIT: i64 = 20;

#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    user_id: Uuid,
    username: String,
    display_name: Option<String>,
    avatar_url: Option<String>,
    accent_color: Option<String>,
    updated_at: chrono::DateTime<Utc>,
}

impl ProfileRow {
    fn into_model(self) -> Profile {
        Profile {
            user_id: self.user_id,
            username: self.username,
            display_name: self.display_name,
            avatar_url: self.avatar_url,
            accent_color: self.accent_color,
            updated_at: self.updated_at,
        }
    }
}

/// Creates or replaces the session user's profile. A username taken by
/// another account surfaces as invalid input, not a server error.
pub async fn upsert_profile(
    pool: &PgPool,
    session: &Session,
    input: ProfileInput,
) -> AppResult<Profile> {
    input.validate()?;

    let profile = Profile {
        user_id: session.user_id,
        username: input.username,
        display_name: input.display_name,
        avatar_url: input.avatar_url,
        accent_color: input.accent_color,
        updated_at: Utc::now(),
    };

    let result = sqlx::query(
        "INSERT INTO profiles (user_id, username, display_name, avatar_url, accent_color, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         ON CONFLICT (user_id) DO UPDATE SET \
         username = EXCLUDED.username, display_name = EXCLUDED.display_name, \
         avatar_url = EXCLUDED.avatar_url, accent_color = EXCLUDED.accent_color, \
         updated_at = EXCLUDED.updated_at",
    )
    .bind(profile.user_id)
    .bind(&profile.username)
    .bind(&profile.display_name)
    .bind(&profile.avatar_url)
    .bind(&profile.accent_color)
    .bind(profile.updated_at)
    .execute(pool)
    .await;

    match result.map_err(AppError::from) {
        Ok(_) => {
            tracing::info!(user_id = %session.user_id, username = %profile.username, "Profile synced");
            Ok(profile)
        }
        // The conflict target is the primary key, so a unique violation here
        // can only be the username index.
        Err(e) if e.is_unique_violation() => Err(AppError::InvalidInput(
            "Username is already taken".to_string(),
        )),
        Err(e) => Err(e),
    }
}

/// Looks up a profile by username, annotated with the viewer's relationship.
pub async fn profile_by_username(
    pool: &PgPool,
    session: &Session,
    username: &str,
) -> AppResult<AnnotatedProfile> {
    let row = sqlx::query_as::<_, ProfileRow>(
        "SELECT user_id, username, display_name, avatar_url, accent_color, updated_at \
         FROM profiles WHERE username = $1",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

    let profile = row.into_model();
    let edges = friends::edges_between(pool, session.user_id, &[profile.user_id]).await?;
    let relationship = friends::derive_relationship(session.user_id, &edges, profile.user_id);

    Ok(AnnotatedProfile {
        profile,
        relationship,
    })
}

/// Case-insensitive prefix/substring search over usernames and display
/// names. One edge query covers relationship annotation for the whole page.
pub async fn search_profiles(
    pool: &PgPool,
    session: &Session,
    query: &str,
) -> AppResult<Vec<AnnotatedProfile>> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let pattern = format!("%{}%", trimmed.replace('%', "\\%").replace('_', "\\_"));
    let rows = sqlx::query_as::<_, ProfileRow>(
        "SELECT user_id, username, display_name, avatar_url, accent_color, updated_at \
         FROM profiles \
         WHERE username ILIKE $1 OR display_name ILIKE $1 \
         ORDER BY username \
         LIMIT $2",
    )
    .bind(&pattern)
    .bind(SEARCH_LIMIT)
    .fetch_all(pool)
    .await?;

    let profiles: Vec<Profile> = rows.into_iter().map(ProfileRow::into_model).collect();
    let candidate_ids: Vec<Uuid> = profiles.iter().map(|p| p.user_id).collect();
    let edges = friends::edges_between(pool, session.user_id, &candidate_ids).await?;
    let states = friends::relationship_map(session.user_id, &edges, &candidate_ids);

    Ok(profiles
        .into_iter()
        .map(|profile| {
            let relationship = states
                .get(&profile.user_id)
                .copied()
                .unwrap_or(RelationshipState::None);
            AnnotatedProfile {
                profile,
                relationship,
            }
        })
        .collect())
}
