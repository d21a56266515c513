use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Student Router Module
///
/// Behind a client gate requiring `role = student`.
pub fn student_routes() -> Router<AppState> {
    Router::new()
        // GET /student/dashboard?q=...
        // Enrollment status and the active courses on offer.
        .route("/dashboard", get(handlers::student_dashboard))
        // POST /student/enroll
        .route("/enroll", post(handlers::enroll))
}
