use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Authenticated Router Module
///
/// Pages for any signed-in user, whatever the role. Handlers receive the
/// resolved identity through the `CurrentUser` extractor.
pub fn authenticated_routes() -> Router<AppState> {
    Router::new()
        // GET /
        // Root: forwards to the role dashboard.
        .route("/", get(handlers::home))
        // GET /redirect
        // Post-login holding page, same forwarding as the root.
        .route("/redirect", get(handlers::home))
        // POST /logout
        // Clears both token slots and returns to /login.
        .route("/logout", post(handlers::logout))
}
