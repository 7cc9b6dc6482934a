//! Friendship state machine.
//!
//! One edge per unordered pair of users: `pending` after a request,
//! `accepted` once the addressee accepts, deleted on decline, cancel or
//! unfriend. The derivation helpers are pure; the async functions wrap the
//! single-row datastore operations with the actor checks from the
//! transition table.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Friendship, FriendshipStatus, RelationshipState};
use crate::state::Session;

/// Computes the relationship between a viewer and a target from the edges
/// touching the viewer. Pure; callers load edges however suits them.
pub fn derive_relationship(
    viewer_id: Uuid,
    edges: &[Friendship],
    target_id: Uuid,
) -> RelationshipState {
    if viewer_id == target_id {
        return RelationshipState::Own;
    }

    let Some(edge) = edges.iter().find(|e| e.connects(viewer_id, target_id)) else {
        return RelationshipState::None;
    };

    match edge.status {
        FriendshipStatus::Accepted => RelationshipState::Friends,
        FriendshipStatus::Pending if edge.requester_id == viewer_id => {
            RelationshipState::PendingSent
        }
        FriendshipStatus::Pending => RelationshipState::PendingReceived,
    }
}

/// Watch logs, watchlists and lists are visible to friends only.
pub fn can_view_friend_data(state: RelationshipState) -> bool {
    state == RelationshipState::Friends
}

/// Relationship states for a batch of candidates against one set of edges.
/// Backs search-time annotation: one edge query for all candidates, never
/// one per candidate.
pub fn relationship_map(
    viewer_id: Uuid,
    edges: &[Friendship],
    candidates: &[Uuid],
) -> HashMap<Uuid, RelationshipState> {
    candidates
        .iter()
        .map(|&id| (id, derive_relationship(viewer_id, edges, id)))
        .collect()
}

#[derive(Debug, sqlx::FromRow)]
struct FriendshipRow {
    id: Uuid,
    requester_id: Uuid,
    addressee_id: Uuid,
    status: String,
    created_at: DateTime<Utc>,
}

impl FriendshipRow {
    fn into_model(self) -> AppResult<Friendship> {
        let status = FriendshipStatus::parse(&self.status).ok_or_else(|| {
            AppError::Internal(format!("Unknown friendship status: {}", self.status))
        })?;
        Ok(Friendship {
            id: self.id,
            requester_id: self.requester_id,
            addressee_id: self.addressee_id,
            status,
            created_at: self.created_at,
        })
    }
}

/// All edges touching one user.
pub async fn edges_for(pool: &PgPool, user_id: Uuid) -> AppResult<Vec<Friendship>> {
    let rows = sqlx::query_as::<_, FriendshipRow>(
        "SELECT id, requester_id, addressee_id, status, created_at
         FROM friendships
         WHERE requester_id = $1 OR addressee_id = $1
         ORDER BY created_at",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(FriendshipRow::into_model).collect()
}

/// Edges between one user and any of the given candidates, in one query.
pub async fn edges_between(
    pool: &PgPool,
    user_id: Uuid,
    others: &[Uuid],
) -> AppResult<Vec<Friendship>> {
    let others = others.to_vec();
    let rows = sqlx::query_as::<_, FriendshipRow>(
        "SELECT id, requester_id, addressee_id, status, created_at
         FROM friendships
         WHERE (requester_id = $1 AND addressee_id = ANY($2))
            OR (addressee_id = $1 AND requester_id = ANY($2))",
    )
    .bind(user_id)
    .bind(others)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(FriendshipRow::into_model).collect()
}

/// Sends a friend request: none -> pending with the actor as requester.
///
/// The pair-uniqueness index rejects a second edge in either direction;
/// that violation is reconciled as "already in the desired state" and is
/// not an error. Re-sending after a cancel creates a fresh edge.
pub async fn send_request(pool: &PgPool, session: &Session, target_id: Uuid) -> AppResult<()> {
    if target_id == session.user_id {
        return Err(AppError::InvalidInput(
            "Cannot send a friend request to yourself".to_string(),
        ));
    }

    let result = sqlx::query(
        "INSERT INTO friendships (id, requester_id, addressee_id, status)
         VALUES ($1, $2, $3, 'pending')",
    )
    .bind(Uuid::new_v4())
    .bind(session.user_id)
    .bind(target_id)
    .execute(pool)
    .await;

    match result.map_err(AppError::from) {
        Ok(_) => {
            tracing::info!(requester = %session.user_id, addressee = %target_id, "Friend request sent");
            Ok(())
        }
        Err(e) if e.is_unique_violation() => {
            tracing::debug!(
                requester = %session.user_id,
                addressee = %target_id,
                "Friend request ignored, an edge already exists for this pair"
            );
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Accepts a pending request: only the addressee may do this.
pub async fn accept_request(pool: &PgPool, session: &Session, requester_id: Uuid) -> AppResult<()> {
    let result = sqlx::query(
        "UPDATE friendships SET status = 'accepted'
         WHERE requester_id = $1 AND addressee_id = $2 AND status = 'pending'",
    )
    .bind(requester_id)
    .bind(session.user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(
            "No pending friend request from that user".to_string(),
        ));
    }

    tracing::info!(requester = %requester_id, addressee = %session.user_id, "Friend request accepted");
    Ok(())
}

/// Declines a pending request: only the addressee may do this. The edge is
/// deleted outright; no rejected state is retained.
pub async fn decline_request(pool: &PgPool, session: &Session, requester_id: Uuid) -> AppResult<()> {
    let result = sqlx::query(
        "DELETE FROM friendships
         WHERE requester_id = $1 AND addressee_id = $2 AND status = 'pending'",
    )
    .bind(requester_id)
    .bind(session.user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(
            "No pending friend request from that user".to_string(),
        ));
    }

    tracing::info!(requester = %requester_id, addressee = %session.user_id, "Friend request declined");
    Ok(())
}

/// Cancels a request the actor sent while it is still pending.
pub async fn cancel_request(pool: &PgPool, session: &Session, addressee_id: Uuid) -> AppResult<()> {
    let result = sqlx::query(
        "DELETE FROM friendships
         WHERE requester_id = $1 AND addressee_id = $2 AND status = 'pending'",
    )
    .bind(session.user_id)
    .bind(addressee_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(
            "No pending friend request to that user".to_string(),
        ));
    }

    tracing::info!(requester = %session.user_id, addressee = %addressee_id, "Friend request cancelled");
    Ok(())
}

/// Removes an accepted friendship; either party may unfriend.
pub async fn unfriend(pool: &PgPool, session: &Session, other_id: Uuid) -> AppResult<()> {
    let result = sqlx::query(
        "DELETE FROM friendships
         WHERE status = 'accepted'
           AND ((requester_id = $1 AND addressee_id = $2)
             OR (requester_id = $2 AND addressee_id = $1))",
    )
    .bind(session.user_id)
    .bind(other_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Not friends with that user".to_string()));
    }

    tracing::info!(user = %session.user_id, other = %other_id, "Unfriended");
    Ok(())
}

/// Removes whatever edge exists between the actor and the other user,
/// applying the actor rules for the edge's current state: cancel a sent
/// request, decline a received one, or unfriend.
pub async fn remove_edge(pool: &PgPool, session: &Session, other_id: Uuid) -> AppResult<()> {
    let edges = edges_between(pool, session.user_id, &[other_id]).await?;

    match derive_relationship(session.user_id, &edges, other_id) {
        RelationshipState::PendingSent => cancel_request(pool, session, other_id).await,
        RelationshipState::PendingReceived => decline_request(pool, session, other_id).await,
        RelationshipState::Friends => unfriend(pool, session, other_id).await,
        _ => Err(AppError::NotFound(
            "No relationship with that user".to_string(),
        )),
    }
}

/// One row of the friends screen: the other user plus the derived state.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FriendListEntry {
    pub user_id: Uuid,
    pub relationship: RelationshipState,
    pub since: DateTime<Utc>,
}

/// The actor's friends and pending requests, both directions.
pub async fn friends_overview(pool: &PgPool, session: &Session) -> AppResult<Vec<FriendListEntry>> {
    let edges = edges_for(pool, session.user_id).await?;

    let mut seen = HashSet::new();
    let mut overview = Vec::with_capacity(edges.len());
    for edge in &edges {
        let other = if edge.requester_id == session.user_id {
            edge.addressee_id
        } else {
            edge.requester_id
        };
        if seen.insert(other) {
            overview.push(FriendListEntry {
                user_id: other,
                relationship: derive_relationship(session.user_id, &edges, other),
                since: edge.created_at,
            });
        }
    }

    Ok(overview)
}

/// Errors unless the session user may read `owner_id`'s watch data: the
/// owner themselves, or an accepted friend. Enforced here for every gated
/// read; the datastore's row-level policy is the outer trust boundary.
pub async fn require_view_access(pool: &PgPool, session: &Session, owner_id: Uuid) -> AppResult<()> {
    if session.user_id == owner_id {
        return Ok(());
    }

    let edges = edges_between(pool, session.user_id, &[owner_id]).await?;
    let state = derive_relationship(session.user_id, &edges, owner_id);

    if can_view_friend_data(state) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "This user's activity is only visible to friends".to_string(),
        ))
    }
}
