use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::PortalError,
    models::{
        AuthPayload, Course, CourseFormData, CourseList, LoginRequest, ProgramPage,
        ProgramQuery, RegisterRequest, StudentFormData, User, UserList, UserQuery, UserUpdate,
    },
};

pub mod graphql;
pub mod http;

pub use http::HttpBackend;

/// Backend
///
/// Everything the portal asks of the REST/GraphQL backend. Handlers and the
/// session only see this trait, so tests swap in stubs without a network.
///
/// Calls that act for a signed-in user take that user's bearer token.
#[async_trait]
pub trait Backend: Send + Sync {
    // --- Auth ---
    async fn login(&self, credentials: &LoginRequest) -> Result<AuthPayload, PortalError>;
    async fn register(&self, request: &RegisterRequest) -> Result<AuthPayload, PortalError>;
    async fn me(&self, token: &str) -> Result<User, PortalError>;

    // --- Programs (courses) ---
    async fn list_programs(&self, token: &str, query: &ProgramQuery)
    -> Result<CourseList, PortalError>;
    async fn get_program(&self, token: &str, id: &str) -> Result<Course, PortalError>;
    async fn create_program(&self, token: &str, form: &CourseFormData)
    -> Result<Course, PortalError>;
    async fn update_program(
        &self,
        token: &str,
        id: &str,
        form: &CourseFormData,
    ) -> Result<Course, PortalError>;
    async fn delete_program(&self, token: &str, id: &str) -> Result<(), PortalError>;

    // --- Users (students) ---
    async fn list_users(&self, token: &str, query: &UserQuery) -> Result<UserList, PortalError>;
    async fn get_user(&self, token: &str, id: &str) -> Result<User, PortalError>;
    async fn create_user(&self, token: &str, form: &StudentFormData) -> Result<User, PortalError>;
    async fn update_user(
        &self,
        token: &str,
        id: &str,
        update: &UserUpdate,
    ) -> Result<User, PortalError>;

    // --- GraphQL ---
    async fn search_programs(
        &self,
        filter: &str,
        page: u32,
        limit: u32,
    ) -> Result<ProgramPage, PortalError>;
}

/// BackendState
///
/// The shared handle stored in `AppState`.
pub type BackendState = Arc<dyn Backend>;

/// Envelope
///
/// Every REST response wraps its payload in `{ "data": ... }`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

/// `data` of `GET /api/auth/me`.
#[derive(Debug, Deserialize)]
pub struct MeData {
    pub user: User,
}
