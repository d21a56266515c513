use crate::{
    AppState,
    auth::{CurrentUser, persist_tokens, token_slots},
    authz,
    error::{ErrorBody, PortalError},
    models::{
        AdminDashboard, AuthMode, AuthPage, Course, CourseFormData, CourseList, CourseSelection,
        CourseStatus, DashboardStats, LoginRequest, ProgramQuery, RegistrationForm, Role,
        SearchResults, StudentDashboard, StudentFormData, User, UserList, UserQuery, UserUpdate,
    },
    search::{self, DebouncedSearch, SearchQuery, StatusFilter},
    session::Session,
    validation,
};
use axum::{
    Json,
    extract::{
        Path, Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

/// Listings the admin dashboard counts over.
const DASHBOARD_SAMPLE: u32 = 100;

// --- Query Structs ---

/// ReturnTarget
///
/// The page a visitor was heading to when the edge gate sent them to login.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct ReturnTarget {
    pub redirect: Option<String>,
}

/// SearchParams
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct SearchParams {
    /// Free text matched by the backend against course fields.
    pub search: Option<String>,
    #[serde(default)]
    pub status: StatusFilter,
}

/// CatalogParams
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct CatalogParams {
    /// Narrows the available courses by name or description.
    pub q: Option<String>,
}

// --- Auth Pages (guest only) ---

/// login_page
///
/// [Guest Route] Login view. Signed-in visitors never get here; the client
/// gate sends them to their dashboard.
#[utoipa::path(
    get,
    path = "/login",
    params(ReturnTarget),
    responses((status = 200, description = "Login page", body = AuthPage))
)]
pub async fn login_page(Query(target): Query<ReturnTarget>) -> Json<AuthPage> {
    Json(AuthPage {
        mode: AuthMode::Login,
        return_to: target.redirect.filter(|t| authz::is_safe_return_target(t)),
    })
}

/// login
///
/// [Guest Route] Exchanges credentials for a token, stores it in both slots
/// and sends the user to the return target or their role dashboard.
#[utoipa::path(
    post,
    path = "/login",
    params(ReturnTarget),
    request_body = LoginRequest,
    responses(
        (status = 303, description = "Signed in"),
        (status = 401, description = "Bad credentials", body = ErrorBody)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(target): Query<ReturnTarget>,
    Json(credentials): Json<LoginRequest>,
) -> Result<(CookieJar, Redirect), PortalError> {
    let mut session = Session::new(token_slots(&jar));
    let user = session.login(state.backend.as_ref(), &credentials).await?;

    let destination = target
        .redirect
        .filter(|t| authz::is_safe_return_target(t))
        .unwrap_or_else(|| user.role.home().to_string());

    Ok((
        persist_tokens(jar, session.tokens(), &state.config),
        Redirect::to(&destination),
    ))
}

/// register_page
///
/// [Guest Route] Registration view.
#[utoipa::path(
    get,
    path = "/register",
    responses((status = 200, description = "Registration page", body = AuthPage))
)]
pub async fn register_page() -> Json<AuthPage> {
    Json(AuthPage {
        mode: AuthMode::Register,
        return_to: None,
    })
}

/// register
///
/// [Guest Route] Creates a student account. The form is validated locally
/// first; a rejected form never reaches the backend.
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegistrationForm,
    responses(
        (status = 303, description = "Registered and signed in"),
        (status = 422, description = "Validation failed", body = ErrorBody)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(form): Json<RegistrationForm>,
) -> Result<(CookieJar, Redirect), PortalError> {
    let mut session = Session::new(token_slots(&jar));
    let user = session.register(state.backend.as_ref(), &form).await?;

    Ok((
        persist_tokens(jar, session.tokens(), &state.config),
        Redirect::to(user.role.home()),
    ))
}

// --- Signed-in Routes ---

/// home
///
/// [Authenticated Route] Holding page: forwards to the role dashboard.
#[utoipa::path(
    get,
    path = "/redirect",
    responses((status = 307, description = "Role dashboard"))
)]
pub async fn home(CurrentUser { user, .. }: CurrentUser) -> Redirect {
    Redirect::temporary(user.role.home())
}

/// logout
///
/// [Authenticated Route] Clears both token slots.
#[utoipa::path(
    post,
    path = "/logout",
    responses((status = 303, description = "Signed out"))
)]
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Redirect) {
    let mut session = Session::new(token_slots(&jar));
    session.logout();
    tracing::info!("session closed");
    (
        persist_tokens(jar, session.tokens(), &state.config),
        Redirect::to(authz::LOGIN_PATH),
    )
}

// --- Admin Routes ---

/// admin_dashboard
///
/// [Admin Route] Course and student counts. A failed listing leaves the
/// counts at zero and reports the error inline.
#[utoipa::path(
    get,
    path = "/admin/dashboard",
    responses((status = 200, description = "Dashboard", body = AdminDashboard))
)]
pub async fn admin_dashboard(
    CurrentUser { user, token }: CurrentUser,
    State(state): State<AppState>,
) -> Json<AdminDashboard> {
    let courses_query = ProgramQuery {
        limit: Some(DASHBOARD_SAMPLE),
        ..ProgramQuery::default()
    };
    let users_query = UserQuery {
        limit: Some(DASHBOARD_SAMPLE),
        ..UserQuery::default()
    };

    let listings = tokio::try_join!(
        state.backend.list_programs(&token, &courses_query),
        state.backend.list_users(&token, &users_query),
    );

    let (stats, error) = match listings {
        Ok((courses, students)) => (
            DashboardStats {
                total_courses: courses.items.len(),
                total_students: students.items.len(),
                active_courses: courses
                    .items
                    .iter()
                    .filter(|c| c.status == CourseStatus::Active)
                    .count(),
            },
            None,
        ),
        Err(e) => {
            tracing::error!(error = %e, "dashboard stats unavailable");
            (DashboardStats::default(), Some(e.to_string()))
        }
    };

    Json(AdminDashboard { user, stats, error })
}

/// list_courses
///
/// [Admin Route] Paged course listing.
#[utoipa::path(
    get,
    path = "/admin/courses",
    params(ProgramQuery),
    responses((status = 200, description = "Courses", body = CourseList))
)]
pub async fn list_courses(
    CurrentUser { token, .. }: CurrentUser,
    State(state): State<AppState>,
    Query(query): Query<ProgramQuery>,
) -> Result<Json<CourseList>, PortalError> {
    let query = ProgramQuery {
        page: query.page.or(Some(1)),
        limit: query.limit.or(Some(10)),
        filter: query.filter.filter(|f| !f.is_empty()),
        ..query
    };
    Ok(Json(state.backend.list_programs(&token, &query).await?))
}

/// create_course
///
/// [Admin Route] Validates and creates a course.
#[utoipa::path(
    post,
    path = "/admin/courses",
    request_body = CourseFormData,
    responses(
        (status = 201, description = "Created", body = Course),
        (status = 422, description = "Validation failed", body = ErrorBody)
    )
)]
pub async fn create_course(
    CurrentUser { token, .. }: CurrentUser,
    State(state): State<AppState>,
    Json(form): Json<CourseFormData>,
) -> Result<(StatusCode, Json<Course>), PortalError> {
    validation::validate_course(&form)?;
    let course = state.backend.create_program(&token, &form).await?;
    tracing::info!(course_id = %course.id, "course created");
    Ok((StatusCode::CREATED, Json(course)))
}

/// get_course
#[utoipa::path(
    get,
    path = "/admin/courses/{id}",
    params(("id" = String, Path, description = "Course ID")),
    responses((status = 200, description = "Found", body = Course))
)]
pub async fn get_course(
    CurrentUser { token, .. }: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Course>, PortalError> {
    Ok(Json(state.backend.get_program(&token, &id).await?))
}

/// update_course
///
/// [Admin Route] Edits a course. Same validation as creation.
#[utoipa::path(
    put,
    path = "/admin/courses/{id}",
    params(("id" = String, Path, description = "Course ID")),
    request_body = CourseFormData,
    responses((status = 200, description = "Updated", body = Course))
)]
pub async fn update_course(
    CurrentUser { token, .. }: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(form): Json<CourseFormData>,
) -> Result<Json<Course>, PortalError> {
    validation::validate_course(&form)?;
    Ok(Json(state.backend.update_program(&token, &id, &form).await?))
}

/// delete_course
#[utoipa::path(
    delete,
    path = "/admin/courses/{id}",
    params(("id" = String, Path, description = "Course ID")),
    responses((status = 204, description = "Deleted"))
)]
pub async fn delete_course(
    CurrentUser { token, .. }: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, PortalError> {
    state.backend.delete_program(&token, &id).await?;
    tracing::info!(course_id = %id, "course deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// list_students
///
/// [Admin Route] All users, optionally narrowed to one course.
#[utoipa::path(
    get,
    path = "/admin/students",
    params(UserQuery),
    responses((status = 200, description = "Students", body = UserList))
)]
pub async fn list_students(
    CurrentUser { token, .. }: CurrentUser,
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<UserList>, PortalError> {
    let query = UserQuery {
        program_id: query.program_id.filter(|id| !id.is_empty()),
        ..query
    };
    Ok(Json(state.backend.list_users(&token, &query).await?))
}

/// create_student
#[utoipa::path(
    post,
    path = "/admin/students",
    request_body = StudentFormData,
    responses(
        (status = 201, description = "Created", body = User),
        (status = 422, description = "Validation failed", body = ErrorBody)
    )
)]
pub async fn create_student(
    CurrentUser { token, .. }: CurrentUser,
    State(state): State<AppState>,
    Json(form): Json<StudentFormData>,
) -> Result<(StatusCode, Json<User>), PortalError> {
    validation::validate_student(&form)?;
    let student = state.backend.create_user(&token, &form).await?;
    Ok((StatusCode::CREATED, Json(student)))
}

/// get_student
#[utoipa::path(
    get,
    path = "/admin/students/{id}",
    params(("id" = String, Path, description = "Student ID")),
    responses((status = 200, description = "Found", body = User))
)]
pub async fn get_student(
    CurrentUser { token, .. }: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<User>, PortalError> {
    Ok(Json(state.backend.get_user(&token, &id).await?))
}

/// assign_course
///
/// [Admin Route] Puts a student on a course.
#[utoipa::path(
    put,
    path = "/admin/students/{id}/course",
    params(("id" = String, Path, description = "Student ID")),
    request_body = CourseSelection,
    responses((status = 200, description = "Assigned", body = User))
)]
pub async fn assign_course(
    CurrentUser { token, .. }: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(selection): Json<CourseSelection>,
) -> Result<Json<User>, PortalError> {
    validation::validate_selection(&selection)?;
    let update = UserUpdate {
        program_id: Some(selection.program_id),
        ..UserUpdate::default()
    };
    Ok(Json(state.backend.update_user(&token, &id, &update).await?))
}

/// search_courses
///
/// [Admin Route] One-shot GraphQL program search.
#[utoipa::path(
    get,
    path = "/admin/graphql",
    params(SearchParams),
    responses((status = 200, description = "Matches", body = SearchResults))
)]
pub async fn search_courses(
    _user: CurrentUser,
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResults>, PortalError> {
    let filter = search::compose_filter(params.search.as_deref().unwrap_or_default(), params.status);
    let page = state
        .backend
        .search_programs(&filter, 1, search::SEARCH_LIMIT)
        .await?;
    Ok(Json(SearchResults {
        filter,
        items: page.items,
        total: page.total,
    }))
}

/// search_socket
///
/// [Admin Route] Live search: the client sends `SearchQuery` JSON frames as
/// the user types and receives a `SearchState` frame whenever results move.
#[utoipa::path(
    get,
    path = "/admin/graphql/ws",
    responses((status = 101, description = "Switching to websocket live search"))
)]
pub async fn search_socket(
    _user: CurrentUser,
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| live_search(socket, state))
}

async fn live_search(mut socket: WebSocket, state: AppState) {
    let search = DebouncedSearch::spawn(state.backend.clone(), state.config.search_debounce);
    let mut results = search.results();

    loop {
        tokio::select! {
            message = socket.recv() => match message {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<SearchQuery>(text.as_str()) {
                        Ok(query) => search.set_query(query),
                        Err(e) => tracing::debug!(error = %e, "ignoring malformed search frame"),
                    }
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
            changed = results.changed() => {
                if changed.is_err() {
                    break;
                }
                let payload = serde_json::to_string(&*results.borrow_and_update());
                let Ok(payload) = payload else { continue };
                if socket.send(Message::Text(payload.into())).await.is_err() {
                    break;
                }
            }
        }
    }
}

// --- Student Routes ---

/// student_dashboard
///
/// [Student Route] The student's enrollment and the active courses on offer.
#[utoipa::path(
    get,
    path = "/student/dashboard",
    params(CatalogParams),
    responses((status = 200, description = "Dashboard", body = StudentDashboard))
)]
pub async fn student_dashboard(
    CurrentUser { user, token }: CurrentUser,
    State(state): State<AppState>,
    Query(params): Query<CatalogParams>,
) -> Json<StudentDashboard> {
    let query = ProgramQuery {
        status: Some(CourseStatus::Active),
        ..ProgramQuery::default()
    };
    let (available_courses, error) = match state.backend.list_programs(&token, &query).await {
        Ok(list) => {
            let term = params.q.unwrap_or_default();
            let courses = list
                .items
                .into_iter()
                .filter(|course| term.is_empty() || course.matches(&term))
                .collect();
            (courses, None)
        }
        Err(e) => (Vec::new(), Some(e.to_string())),
    };

    Json(StudentDashboard {
        enrolled: user.is_enrolled(),
        user,
        available_courses,
        error,
    })
}

/// enroll
///
/// [Student Route] Enrolls the signed-in student on a course.
#[utoipa::path(
    post,
    path = "/student/enroll",
    request_body = CourseSelection,
    responses(
        (status = 200, description = "Enrolled", body = User),
        (status = 422, description = "No course selected", body = ErrorBody)
    )
)]
pub async fn enroll(
    CurrentUser { user, token }: CurrentUser,
    State(state): State<AppState>,
    Json(selection): Json<CourseSelection>,
) -> Result<Json<User>, PortalError> {
    validation::validate_selection(&selection)?;
    if user.role != Role::Student {
        return Err(PortalError::Unauthorized);
    }
    let update = UserUpdate {
        program_id: Some(selection.program_id.clone()),
        ..UserUpdate::default()
    };
    let updated = state.backend.update_user(&token, &user.id, &update).await?;
    tracing::info!(user_id = %user.id, program_id = %selection.program_id, "student enrolled");
    Ok(Json(updated))
}

// --- Fallback ---

/// not_found
///
/// Unknown pages point back to the login page.
pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            message: format!("page not found, return to {}", authz::LOGIN_PATH),
            category: None,
        }),
    )
}
