use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::Cache;
use crate::error::AppError;
use crate::services::providers::MetadataProvider;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub cache: Cache,
    pub provider: Arc<dyn MetadataProvider>,
}

impl AppState {
    pub fn new(db: PgPool, cache: Cache, provider: Arc<dyn MetadataProvider>) -> Self {
        Self {
            db,
            cache,
            provider,
        }
    }
}

/// HTTP header carrying the authenticated user id, set by the auth proxy
pub const USER_ID_HEADER: &str = "x-user-id";

/// The acting user, passed explicitly into every service call.
///
/// Authentication itself is delegated upstream; this extractor only trusts
/// the id header the proxy injects. Core functions take a `Session` (or a
/// plain viewer id) instead of reading ambient global state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub user_id: Uuid,
}

#[async_trait::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Session {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|h| h.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or_else(|| {
                AppError::Unauthorized(format!("Missing or invalid {} header", USER_ID_HEADER))
            })?;

        Ok(Session { user_id })
    }
}
