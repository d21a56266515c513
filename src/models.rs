use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

// --- Identity ---

/// Role
///
/// The RBAC field carried by every resolved user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Student,
}

impl Role {
    /// The dashboard a user of this role lands on.
    pub fn home(self) -> &'static str {
        match self {
            Role::Admin => "/admin/dashboard",
            Role::Student => "/student/dashboard",
        }
    }
}

/// User
///
/// Identity as returned by `GET /api/auth/me`, the login/registration
/// responses and the user listings. The backend may send the identifier as
/// `id`, `_id` or both; call [`User::normalized`] before trusting `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub id: String,
    #[serde(default, rename = "_id", skip_serializing)]
    pub object_id: Option<String>,
    #[serde(default)]
    pub full_name: String,
    pub email: String,
    pub role: Role,
    /// Enrollment: either a bare course id or the populated course.
    #[serde(default, rename = "programId", skip_serializing_if = "Option::is_none")]
    pub program: Option<ProgramRef>,
}

impl User {
    /// Collapses `_id`/`id` into `id`, preferring `_id` when both are present.
    pub fn normalized(mut self) -> Self {
        if let Some(object_id) = self.object_id.take().filter(|id| !id.is_empty()) {
            self.id = object_id;
        }
        self.program = self.program.map(ProgramRef::normalized);
        self
    }

    pub fn is_enrolled(&self) -> bool {
        self.program.is_some()
    }
}

/// ProgramRef
///
/// A user's course reference. Listings populate it, some endpoints do not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum ProgramRef {
    Id(String),
    Course(Course),
}

impl ProgramRef {
    pub fn id(&self) -> &str {
        match self {
            ProgramRef::Id(id) => id,
            ProgramRef::Course(course) => &course.id,
        }
    }

    fn normalized(self) -> Self {
        match self {
            ProgramRef::Course(course) => ProgramRef::Course(course.normalized()),
            id => id,
        }
    }
}

// --- Courses ---

/// CourseStatus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CourseStatus {
    #[default]
    Active,
    Inactive,
    Completed,
}

/// Course
///
/// A program record owned by the backend (`/api/programs`). Populated
/// enrollments may omit most fields, hence the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    #[serde(default)]
    pub id: String,
    #[serde(default, rename = "_id", skip_serializing)]
    pub object_id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: CourseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Course {
    pub fn normalized(mut self) -> Self {
        if let Some(object_id) = self.object_id.take().filter(|id| !id.is_empty()) {
            self.id = object_id;
        }
        self
    }

    /// Case-insensitive match against name or description.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.name.to_lowercase().contains(&term) || self.description.to_lowercase().contains(&term)
    }
}

/// CourseList
///
/// Paged listing returned by `GET /api/programs`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CourseList {
    pub items: Vec<Course>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub pages: u32,
}

/// UserList
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserList {
    pub items: Vec<User>,
    #[serde(default)]
    pub total: u64,
}

/// ProgramQuery
///
/// Listing parameters, accepted from portal clients and forwarded verbatim
/// to `GET /api/programs`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, IntoParams)]
pub struct ProgramQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CourseStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// UserQuery
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

// --- Request payloads ---

/// LoginRequest
///
/// Credentials for `POST /login`, forwarded to `POST /api/auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// RegistrationForm
///
/// What the registration page submits. `confirm_password` never leaves the
/// portal.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationForm {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    #[serde(default)]
    pub program_id: Option<String>,
}

/// Placeholder program id sent when a student registers without a course.
pub const UNASSIGNED_PROGRAM_ID: &str = "000000000000000000000000";

/// RegisterRequest
///
/// Body of `POST /api/auth/register`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub program_id: String,
}

impl From<&RegistrationForm> for RegisterRequest {
    fn from(form: &RegistrationForm) -> Self {
        Self {
            full_name: form.full_name.trim().to_string(),
            email: form.email.trim().to_string(),
            password: form.password.clone(),
            program_id: form
                .program_id
                .clone()
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| UNASSIGNED_PROGRAM_ID.to_string()),
        }
    }
}

/// AuthPayload
///
/// `data` of the login and registration responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthPayload {
    pub user: User,
    pub token: String,
}

/// CourseFormData
///
/// Create/edit payload for a course.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseFormData {
    pub name: String,
    pub description: String,
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: CourseStatus,
}

/// StudentFormData
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentFormData {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub program_id: String,
}

/// CourseSelection
///
/// Body of the assign (admin) and enroll (student) actions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseSelection {
    #[serde(default)]
    pub program_id: String,
}

/// UserUpdate
///
/// Partial body of `PUT /api/users/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

// --- GraphQL ---

/// ProgramSummary
///
/// The projection the GraphQL `programs` query selects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProgramSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub status: CourseStatus,
}

/// ProgramPage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProgramPage {
    pub items: Vec<ProgramSummary>,
    pub total: u64,
}

// --- Page views ---

/// AuthMode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    Login,
    Register,
}

/// AuthPage
///
/// View for the guest-only pages.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthPage {
    pub mode: AuthMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_to: Option<String>,
}

/// DashboardStats
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_courses: usize,
    pub total_students: usize,
    pub active_courses: usize,
}

/// AdminDashboard
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdminDashboard {
    pub user: User,
    pub stats: DashboardStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// StudentDashboard
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentDashboard {
    pub user: User,
    pub enrolled: bool,
    pub available_courses: Vec<Course>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// SearchResults
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SearchResults {
    pub filter: String,
    pub items: Vec<ProgramSummary>,
    pub total: u64,
}
