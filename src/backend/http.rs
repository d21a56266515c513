use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use super::{
    Backend, Envelope, MeData,
    graphql::{self, GraphQlResponse, ProgramsData},
};
use crate::{
    config::AppConfig,
    error::{ErrorBody, PortalError},
    models::{
        AuthPayload, Course, CourseFormData, CourseList, LoginRequest, ProgramPage,
        ProgramQuery, RegisterRequest, StudentFormData, User, UserList, UserQuery, UserUpdate,
    },
};

/// HttpBackend
///
/// The real backend client over reqwest. One pooled `Client` is shared by
/// every request; its timeout is the only time limit on backend calls.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    graphql_url: String,
}

impl HttpBackend {
    pub fn new(config: &AppConfig) -> Result<Self, PortalError> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            client,
            base_url: config.backend_url.trim_end_matches('/').to_string(),
            graphql_url: config.graphql_url.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, builder: RequestBuilder, token: &str) -> RequestBuilder {
        builder.bearer_auth(token)
    }
}

/// Turns a non-2xx response into `PortalError::Backend`, preferring the
/// backend's own `{message}` over `fallback`.
async fn check(response: Response, fallback: &str) -> Result<Response, PortalError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .json::<ErrorBody>()
        .await
        .ok()
        .map(|body| body.message)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| fallback.to_string());
    tracing::debug!(%status, %message, "backend rejected request");
    Err(PortalError::Backend { status, message })
}

async fn read_data<T: DeserializeOwned>(response: Response, fallback: &str) -> Result<T, PortalError> {
    let response = check(response, fallback).await?;
    Ok(response.json::<Envelope<T>>().await?.data)
}

fn normalize_payload(payload: AuthPayload) -> AuthPayload {
    AuthPayload {
        user: payload.user.normalized(),
        ..payload
    }
}

fn normalize_courses(mut list: CourseList) -> CourseList {
    list.items = list.items.into_iter().map(Course::normalized).collect();
    list
}

#[async_trait]
impl Backend for HttpBackend {
    async fn login(&self, credentials: &LoginRequest) -> Result<AuthPayload, PortalError> {
        let response = self
            .client
            .post(self.url("/api/auth/login"))
            .json(credentials)
            .send()
            .await?;
        read_data(response, "login failed").await.map(normalize_payload)
    }

    async fn register(&self, request: &RegisterRequest) -> Result<AuthPayload, PortalError> {
        let response = self
            .client
            .post(self.url("/api/auth/register"))
            .json(request)
            .send()
            .await?;
        read_data(response, "registration failed")
            .await
            .map(normalize_payload)
    }

    async fn me(&self, token: &str) -> Result<User, PortalError> {
        let response = self
            .authorized(self.client.get(self.url("/api/auth/me")), token)
            .send()
            .await?;
        let data: MeData = read_data(response, "could not load profile").await?;
        Ok(data.user.normalized())
    }

    async fn list_programs(
        &self,
        token: &str,
        query: &ProgramQuery,
    ) -> Result<CourseList, PortalError> {
        let response = self
            .authorized(self.client.get(self.url("/api/programs")), token)
            .query(query)
            .send()
            .await?;
        read_data(response, "failed to load courses")
            .await
            .map(normalize_courses)
    }

    async fn get_program(&self, token: &str, id: &str) -> Result<Course, PortalError> {
        let response = self
            .authorized(self.client.get(self.url(&format!("/api/programs/{id}"))), token)
            .send()
            .await?;
        read_data(response, "failed to load course")
            .await
            .map(Course::normalized)
    }

    async fn create_program(
        &self,
        token: &str,
        form: &CourseFormData,
    ) -> Result<Course, PortalError> {
        let response = self
            .authorized(self.client.post(self.url("/api/programs")), token)
            .json(form)
            .send()
            .await?;
        read_data(response, "failed to create course")
            .await
            .map(Course::normalized)
    }

    async fn update_program(
        &self,
        token: &str,
        id: &str,
        form: &CourseFormData,
    ) -> Result<Course, PortalError> {
        let response = self
            .authorized(self.client.put(self.url(&format!("/api/programs/{id}"))), token)
            .json(form)
            .send()
            .await?;
        read_data(response, "failed to update course")
            .await
            .map(Course::normalized)
    }

    async fn delete_program(&self, token: &str, id: &str) -> Result<(), PortalError> {
        let response = self
            .authorized(self.client.delete(self.url(&format!("/api/programs/{id}"))), token)
            .send()
            .await?;
        check(response, "failed to delete course").await?;
        Ok(())
    }

    async fn list_users(&self, token: &str, query: &UserQuery) -> Result<UserList, PortalError> {
        let response = self
            .authorized(self.client.get(self.url("/api/users")), token)
            .query(query)
            .send()
            .await?;
        let mut list: UserList = read_data(response, "failed to load students").await?;
        list.items = list.items.into_iter().map(User::normalized).collect();
        Ok(list)
    }

    async fn get_user(&self, token: &str, id: &str) -> Result<User, PortalError> {
        let response = self
            .authorized(self.client.get(self.url(&format!("/api/users/{id}"))), token)
            .send()
            .await?;
        read_data(response, "failed to load student")
            .await
            .map(User::normalized)
    }

    async fn create_user(&self, token: &str, form: &StudentFormData) -> Result<User, PortalError> {
        let response = self
            .authorized(self.client.post(self.url("/api/users")), token)
            .json(form)
            .send()
            .await?;
        read_data(response, "failed to create student")
            .await
            .map(User::normalized)
    }

    async fn update_user(
        &self,
        token: &str,
        id: &str,
        update: &UserUpdate,
    ) -> Result<User, PortalError> {
        let response = self
            .authorized(self.client.put(self.url(&format!("/api/users/{id}"))), token)
            .json(update)
            .send()
            .await?;
        read_data(response, "failed to update student")
            .await
            .map(User::normalized)
    }

    async fn search_programs(
        &self,
        filter: &str,
        page: u32,
        limit: u32,
    ) -> Result<ProgramPage, PortalError> {
        let response = self
            .client
            .post(&self.graphql_url)
            .json(&graphql::programs_request(filter, page, limit))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PortalError::GraphQl(format!("HTTP error: {status}")));
        }
        let body: GraphQlResponse<ProgramsData> = response.json().await?;
        Ok(body.into_result()?.programs)
    }
}
