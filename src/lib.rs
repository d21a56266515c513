use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Access decisions, session state and the gates built on them.
pub mod auth;
pub mod authz;
pub mod gate;
pub mod session;

// Backend client, request handlers and their data.
pub mod backend;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod search;
pub mod validation;

// Page areas (public, guest-only, signed-in, admin, student).
pub mod routes;
use routes::{admin, authenticated, public, student};

// --- Public Re-exports ---

pub use backend::{Backend, BackendState, HttpBackend};
pub use config::AppConfig;

use auth::{AreaGuard, client_gate, edge_gate};
use gate::ClientGate;
use models::Role;

/// ApiDoc
///
/// OpenAPI document for every portal page and action, served at
/// `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::login_page, handlers::login, handlers::register_page, handlers::register,
        handlers::home, handlers::logout, handlers::admin_dashboard, handlers::list_courses,
        handlers::create_course, handlers::get_course, handlers::update_course,
        handlers::delete_course, handlers::list_students, handlers::create_student,
        handlers::get_student, handlers::assign_course, handlers::search_courses,
        handlers::search_socket, handlers::student_dashboard, handlers::enroll
    ),
    components(
        schemas(
            models::User, models::Role, models::ProgramRef, models::Course, models::CourseStatus,
            models::CourseList, models::UserList, models::LoginRequest, models::RegistrationForm,
            models::CourseFormData, models::StudentFormData, models::CourseSelection,
            models::ProgramSummary, models::AuthMode, models::AuthPage, models::DashboardStats,
            models::AdminDashboard, models::StudentDashboard, models::SearchResults,
            search::SearchQuery, search::SearchState, search::StatusFilter,
            error::ErrorBody, error::ErrorCategory,
        )
    ),
    tags(
        (name = "edu-portal", description = "Education portal: course and student management")
    )
)]
struct ApiDoc;

/// AppState
///
/// Shared, immutable services handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Client for the REST/GraphQL backend.
    pub backend: BackendState,
    pub config: AppConfig,
}

impl FromRef<AppState> for BackendState {
    fn from_ref(app_state: &AppState) -> BackendState {
        app_state.backend.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the portal. Every request first passes the edge gate; each page
/// area then carries its own client gate as a route layer.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        // Guest-only pages: signed-in visitors are sent to their dashboard.
        .merge(public::auth_routes().route_layer(middleware::from_fn_with_state(
            area_guard(&state, ClientGate::guest()),
            client_gate,
        )))
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                area_guard(&state, ClientGate::signed_in()),
                client_gate,
            )),
        )
        .nest(
            "/admin",
            admin::admin_routes().route_layer(middleware::from_fn_with_state(
                area_guard(&state, ClientGate::role(Role::Admin)),
                client_gate,
            )),
        )
        .nest(
            "/student",
            student::student_routes().route_layer(middleware::from_fn_with_state(
                area_guard(&state, ClientGate::role(Role::Student)),
                client_gate,
            )),
        )
        .fallback(handlers::not_found)
        .with_state(state);

    base_router
        .layer(middleware::from_fn(edge_gate))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

fn area_guard(state: &AppState, gate: ClientGate) -> AreaGuard {
    AreaGuard::new(state.backend.clone(), state.config.clone(), gate)
}

/// trace_span_logger
///
/// Span for `TraceLayer`, correlated by the `x-request-id` header.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = %request.uri().path(),
        req_id = %request_id,
    )
}
