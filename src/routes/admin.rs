use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, put},
};

/// Admin Router Module
///
/// Course and student management. The whole router sits behind a client
/// gate requiring `role = admin`; students who reach it are sent to their
/// own dashboard.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/dashboard
        // Course, active course and student counts.
        .route("/dashboard", get(handlers::admin_dashboard))
        // --- Courses ---
        .route(
            "/courses",
            get(handlers::list_courses).post(handlers::create_course),
        )
        .route(
            "/courses/{id}",
            get(handlers::get_course)
                .put(handlers::update_course)
                .delete(handlers::delete_course),
        )
        // --- Students ---
        .route(
            "/students",
            get(handlers::list_students).post(handlers::create_student),
        )
        .route("/students/{id}", get(handlers::get_student))
        // PUT /admin/students/{id}/course
        // Assigns a student to a course.
        .route("/students/{id}/course", put(handlers::assign_course))
        // --- GraphQL search ---
        // GET /admin/graphql?search=...&status=...
        .route("/graphql", get(handlers::search_courses))
        // GET /admin/graphql/ws
        // Live, debounced search over a websocket.
        .route("/graphql/ws", get(handlers::search_socket))
}
