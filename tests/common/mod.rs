#![allow(dead_code)]

use async_trait::async_trait;
use axum::http::StatusCode;
use edu_portal::{
    AppState,
    backend::{Backend, BackendState},
    config::AppConfig,
    error::PortalError,
    models::{
        AuthPayload, Course, CourseFormData, CourseList, CourseStatus, LoginRequest, ProgramPage,
        ProgramQuery, ProgramRef, RegisterRequest, Role, StudentFormData, User, UserList,
        UserQuery, UserUpdate,
    },
};
use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

pub const ADMIN_TOKEN: &str = "admin-token";
pub const STUDENT_TOKEN: &str = "student-token";
pub const PASSWORD: &str = "secret1";

// --- STUB BACKEND ---

// Canned backend. Tokens map to users; everything else is served from the
// vectors below. Calls that tests assert on are recorded.
#[derive(Default)]
pub struct StubBackend {
    pub sessions: HashMap<String, User>,
    pub courses: Vec<Course>,
    pub students: Vec<User>,
    pub search_page: ProgramPage,
    pub fail_listings: bool,
    pub fail_search: AtomicBool,

    pub me_calls: AtomicUsize,
    pub register_calls: AtomicUsize,
    pub registered: Mutex<Vec<RegisterRequest>>,
    pub listing_queries: Mutex<Vec<ProgramQuery>>,
    pub search_filters: Mutex<Vec<String>>,
    pub user_updates: Mutex<Vec<(String, UserUpdate)>>,
}

impl StubBackend {
    /// Backend that knows the admin and student sessions.
    pub fn with_sessions() -> Self {
        let mut sessions = HashMap::new();
        sessions.insert(ADMIN_TOKEN.to_string(), admin());
        sessions.insert(STUDENT_TOKEN.to_string(), student());
        Self {
            sessions,
            ..Self::default()
        }
    }

    pub fn me_calls(&self) -> usize {
        self.me_calls.load(Ordering::SeqCst)
    }

    pub fn register_calls(&self) -> usize {
        self.register_calls.load(Ordering::SeqCst)
    }

    pub fn searched(&self) -> Vec<String> {
        self.search_filters.lock().unwrap().clone()
    }
}

fn rejected(status: StatusCode, message: &str) -> PortalError {
    PortalError::Backend {
        status,
        message: message.to_string(),
    }
}

#[async_trait]
impl Backend for StubBackend {
    async fn login(&self, credentials: &LoginRequest) -> Result<AuthPayload, PortalError> {
        self.sessions
            .iter()
            .find(|(_, user)| user.email == credentials.email && credentials.password == PASSWORD)
            .map(|(token, user)| AuthPayload {
                user: user.clone(),
                token: token.clone(),
            })
            .ok_or_else(|| rejected(StatusCode::UNAUTHORIZED, "Invalid credentials"))
    }

    async fn register(&self, request: &RegisterRequest) -> Result<AuthPayload, PortalError> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        self.registered.lock().unwrap().push(request.clone());
        Ok(AuthPayload {
            user: User {
                id: "new-student".to_string(),
                object_id: None,
                full_name: request.full_name.clone(),
                email: request.email.clone(),
                role: Role::Student,
                program: None,
            },
            token: "fresh-token".to_string(),
        })
    }

    async fn me(&self, token: &str) -> Result<User, PortalError> {
        self.me_calls.fetch_add(1, Ordering::SeqCst);
        self.sessions
            .get(token)
            .cloned()
            .ok_or_else(|| rejected(StatusCode::UNAUTHORIZED, "Invalid token"))
    }

    async fn list_programs(
        &self,
        _token: &str,
        query: &ProgramQuery,
    ) -> Result<CourseList, PortalError> {
        self.listing_queries.lock().unwrap().push(query.clone());
        if self.fail_listings {
            return Err(rejected(StatusCode::INTERNAL_SERVER_ERROR, "failed to load courses"));
        }
        let items: Vec<Course> = self
            .courses
            .iter()
            .filter(|c| query.status.is_none_or(|status| c.status == status))
            .cloned()
            .collect();
        Ok(CourseList {
            total: items.len() as u64,
            items,
            page: 1,
            pages: 1,
        })
    }

    async fn get_program(&self, _token: &str, id: &str) -> Result<Course, PortalError> {
        self.courses
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| rejected(StatusCode::NOT_FOUND, "Program not found"))
    }

    async fn create_program(
        &self,
        _token: &str,
        form: &CourseFormData,
    ) -> Result<Course, PortalError> {
        let mut created = course("new-course", &form.name, form.status);
        created.description = form.description.clone();
        Ok(created)
    }

    async fn update_program(
        &self,
        token: &str,
        id: &str,
        form: &CourseFormData,
    ) -> Result<Course, PortalError> {
        let mut updated = self.get_program(token, id).await?;
        updated.name = form.name.clone();
        updated.description = form.description.clone();
        updated.status = form.status;
        Ok(updated)
    }

    async fn delete_program(&self, token: &str, id: &str) -> Result<(), PortalError> {
        self.get_program(token, id).await.map(|_| ())
    }

    async fn list_users(&self, _token: &str, query: &UserQuery) -> Result<UserList, PortalError> {
        if self.fail_listings {
            return Err(rejected(StatusCode::INTERNAL_SERVER_ERROR, "failed to load students"));
        }
        let items: Vec<User> = self
            .students
            .iter()
            .filter(|u| match &query.program_id {
                Some(id) => u.program.as_ref().is_some_and(|p| p.id() == id),
                None => true,
            })
            .cloned()
            .collect();
        Ok(UserList {
            total: items.len() as u64,
            items,
        })
    }

    async fn get_user(&self, _token: &str, id: &str) -> Result<User, PortalError> {
        self.students
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or_else(|| rejected(StatusCode::NOT_FOUND, "User not found"))
    }

    async fn create_user(&self, _token: &str, form: &StudentFormData) -> Result<User, PortalError> {
        Ok(User {
            id: "created-student".to_string(),
            object_id: None,
            full_name: form.full_name.clone(),
            email: form.email.clone(),
            role: Role::Student,
            program: Some(ProgramRef::Id(form.program_id.clone())),
        })
    }

    async fn update_user(
        &self,
        _token: &str,
        id: &str,
        update: &UserUpdate,
    ) -> Result<User, PortalError> {
        self.user_updates
            .lock()
            .unwrap()
            .push((id.to_string(), update.clone()));
        let mut user = self
            .sessions
            .values()
            .chain(self.students.iter())
            .find(|u| u.id == id)
            .cloned()
            .ok_or_else(|| rejected(StatusCode::NOT_FOUND, "User not found"))?;
        if let Some(program_id) = &update.program_id {
            user.program = Some(ProgramRef::Id(program_id.clone()));
        }
        Ok(user)
    }

    async fn search_programs(
        &self,
        filter: &str,
        _page: u32,
        _limit: u32,
    ) -> Result<ProgramPage, PortalError> {
        self.search_filters.lock().unwrap().push(filter.to_string());
        if self.fail_search.load(Ordering::SeqCst) {
            return Err(PortalError::GraphQl("search unavailable".to_string()));
        }
        Ok(self.search_page.clone())
    }
}

// --- FIXTURES ---

pub fn admin() -> User {
    User {
        id: "admin-1".to_string(),
        object_id: None,
        full_name: "Ada Admin".to_string(),
        email: "admin@school.edu".to_string(),
        role: Role::Admin,
        program: None,
    }
}

pub fn student() -> User {
    User {
        id: "student-1".to_string(),
        object_id: None,
        full_name: "Sam Student".to_string(),
        email: "sam@school.edu".to_string(),
        role: Role::Student,
        program: None,
    }
}

pub fn course(id: &str, name: &str, status: CourseStatus) -> Course {
    Course {
        id: id.to_string(),
        object_id: None,
        name: name.to_string(),
        description: format!("{name} description"),
        start_date: None,
        status,
        created_at: None,
        updated_at: None,
    }
}

pub fn test_state(backend: Arc<StubBackend>) -> AppState {
    AppState {
        backend: backend as BackendState,
        config: AppConfig::default(),
    }
}
