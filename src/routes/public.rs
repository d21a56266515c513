use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Endpoints that are never gated by identity.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe. Does not touch the backend.
        .route("/health", get(|| async { "ok" }))
}

/// Auth Router Module
///
/// The guest-only pages. Anonymous visitors may use them; the client gate
/// layered on top sends signed-in visitors to their role dashboard.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        // GET/POST /login?redirect=...
        // Sign in. A safe `redirect` target wins over the role dashboard.
        .route("/login", get(handlers::login_page).post(handlers::login))
        // GET/POST /register
        // Self-registration of a student account.
        .route("/register", get(handlers::register_page).post(handlers::register))
}
