//! The one GraphQL query the portal issues.

use serde::{Deserialize, Serialize};

use crate::{error::PortalError, models::ProgramPage};

pub const PROGRAMS_QUERY: &str = "query GetPrograms($filter: String, $page: Int, $limit: Int) {
  programs(filter: $filter, page: $page, limit: $limit) {
    items { id name description status }
    total
  }
}";

#[derive(Debug, Serialize)]
pub struct GraphQlRequest<V> {
    pub query: &'static str,
    pub variables: V,
}

#[derive(Debug, Serialize)]
pub struct ProgramsVariables<'a> {
    pub filter: &'a str,
    pub page: u32,
    pub limit: u32,
}

pub fn programs_request(filter: &str, page: u32, limit: u32) -> GraphQlRequest<ProgramsVariables<'_>> {
    GraphQlRequest {
        query: PROGRAMS_QUERY,
        variables: ProgramsVariables {
            filter,
            page,
            limit,
        },
    }
}

#[derive(Debug, Deserialize)]
pub struct GraphQlError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

impl<T> GraphQlResponse<T> {
    /// The first reported error wins, even when partial data came along.
    pub fn into_result(self) -> Result<T, PortalError> {
        if let Some(error) = self.errors.into_iter().next() {
            return Err(PortalError::GraphQl(error.message));
        }
        self.data
            .ok_or_else(|| PortalError::GraphQl("empty GraphQL response".to_string()))
    }
}

#[derive(Debug, Deserialize)]
pub struct ProgramsData {
    pub programs: ProgramPage,
}
