use axum::{
    http::StatusCode,
    middleware::from_fn,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::middleware::{make_span_with_request_id, request_id_middleware};
use crate::state::AppState;

pub mod analytics;
pub mod friends;
pub mod lists;
pub mod logs;
pub mod profiles;
pub mod titles;

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/titles/search", get(titles::search))
        .route("/titles/:kind/:id", get(titles::detail))
        .route("/titles/:kind/:id/providers", get(titles::watch_providers))
        .route("/titles/:kind/:id/similar", get(titles::similar))
        .route("/people/:id/credits", get(titles::person_credits))
        .route("/logs", post(logs::create))
        .route("/logs/:id", put(logs::update).delete(logs::remove))
        .route("/users/:user_id/logs", get(logs::list_for_user))
        .route("/users/:user_id/analytics", get(analytics::for_user))
        .route("/friends", get(friends::overview))
        .route(
            "/friends/:user_id",
            post(friends::send_request).delete(friends::remove),
        )
        .route("/friends/:user_id/accept", post(friends::accept_request))
        .route("/profile", put(profiles::upsert))
        .route("/profiles/search", get(profiles::search))
        .route("/profiles/:username", get(profiles::by_username))
        .route("/users/:user_id/watchlist", get(lists::watchlist_for_user))
        .route("/watchlist", post(lists::add_to_watchlist))
        .route("/watchlist/:tmdb_id", delete(lists::remove_from_watchlist))
        .route("/users/:user_id/lists", get(lists::lists_for_user))
        .route("/lists", post(lists::create_list))
        .route(
            "/lists/:id",
            get(lists::list_detail).delete(lists::delete_list),
        )
        .route("/lists/:id/items", post(lists::add_item))
        .route("/lists/:id/items/:tmdb_id", delete(lists::remove_item))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
