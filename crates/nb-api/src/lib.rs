//! # nb-api
//!
//! The web routing and orchestration layer for Nestboard.

pub mod handlers;

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub use handlers::AppState;

/// Builds the board's route tree over a shared store.
///
/// Kept as a plain `Router` constructor so the main binary can mount it
/// under a different prefix if needed (e.g. /api/v1/).
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/posts",
            get(handlers::list_posts).post(handlers::create_post),
        )
        .route("/posts/{post_id}", get(handlers::view_thread))
        .route("/posts/{post_id}/comments", post(handlers::create_comment))
        .route("/posts/{post_id}/votes", post(handlers::cast_vote))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
