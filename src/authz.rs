//! Authorization decisions shared by both gates.
//!
//! The portal checks access twice on purpose:
//!
//! 1. The **edge** tier runs before routing and sees only the request path and
//!    whether a `token` cookie exists. It cannot know the role, so it only
//!    keeps token-less requests out of protected paths.
//! 2. The **client** tier runs per page area after the token has been
//!    exchanged for an identity, and enforces sign-in, guest-only and role
//!    requirements.
//!
//! The tiers can disagree transiently: a stale cookie passes the edge and is
//! then turned away by the client tier once identity resolution fails.

use url::form_urlencoded;

use crate::models::{Role, User};

pub const LOGIN_PATH: &str = "/login";
pub const RETURN_PARAM: &str = "redirect";

/// Paths that never require a token. `/login` and `/register` are also the
/// guest-only pages.
const PUBLIC_PREFIXES: &[&str] = &[
    "/login",
    "/register",
    "/health",
    "/static",
    "/assets",
    "/favicon.ico",
    "/swagger-ui",
    "/api-docs",
];

const GUEST_PREFIXES: &[&str] = &["/login", "/register"];

/// RouteClass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Public,
    Protected,
}

/// Decision
///
/// What a gate tells the request pipeline to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// Identity not resolved yet: show a placeholder and do nothing else.
    Wait,
    Redirect(String),
}

/// Identity
///
/// What the client tier knows about the visitor.
#[derive(Debug, Clone, Copy)]
pub enum Identity<'a> {
    Pending,
    Anonymous,
    Resolved(&'a User),
}

/// Requirement
///
/// The access rule of one page area.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Requirement {
    pub require_auth: bool,
    pub role: Option<Role>,
    /// Where a signed-in visitor of a guest-only area is sent instead of the
    /// role dashboard.
    pub redirect_to: Option<String>,
}

/// Segment-aware prefix match: `/login` covers `/login` and `/login/...`
/// but not `/loginx`.
fn has_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || prefix.ends_with('/'),
        None => false,
    }
}

pub fn classify(path: &str) -> RouteClass {
    if PUBLIC_PREFIXES.iter().any(|prefix| has_prefix(path, prefix)) {
        RouteClass::Public
    } else {
        RouteClass::Protected
    }
}

pub fn is_guest_only(path: &str) -> bool {
    GUEST_PREFIXES.iter().any(|prefix| has_prefix(path, prefix))
}

/// Builds `/login?redirect=<path[?query]>`.
pub fn login_redirect(path: &str, query: Option<&str>) -> String {
    let target = match query {
        Some(query) if !query.is_empty() => format!("{path}?{query}"),
        _ => path.to_string(),
    };
    let encoded: String = form_urlencoded::byte_serialize(target.as_bytes()).collect();
    format!("{LOGIN_PATH}?{RETURN_PARAM}={encoded}")
}

/// A return target is honoured only when it stays on this origin and points
/// at a protected page. Browsers drop tabs and newlines from `Location`, so
/// control characters are refused outright.
pub fn is_safe_return_target(target: &str) -> bool {
    let path = target.split(['?', '#']).next().unwrap_or_default();
    target.starts_with('/')
        && !target.starts_with("//")
        && !target.contains('\\')
        && !target.chars().any(char::is_control)
        && classify(path) == RouteClass::Protected
}

/// Edge tier: role-blind, token presence only. The token is never decoded.
pub fn edge_decision(path: &str, query: Option<&str>, token: Option<&str>) -> Decision {
    if classify(path) == RouteClass::Public {
        return Decision::Allow;
    }
    match token {
        Some(token) if !token.is_empty() => Decision::Allow,
        _ => Decision::Redirect(login_redirect(path, query)),
    }
}

/// Client tier: evaluated against the resolved identity.
pub fn client_decision(identity: Identity<'_>, requirement: &Requirement) -> Decision {
    let user = match identity {
        Identity::Pending => return Decision::Wait,
        Identity::Anonymous => None,
        Identity::Resolved(user) => Some(user),
    };

    match (requirement.require_auth, user) {
        (true, None) => Decision::Redirect(LOGIN_PATH.to_string()),
        (false, Some(user)) => Decision::Redirect(
            requirement
                .redirect_to
                .clone()
                .unwrap_or_else(|| user.role.home().to_string()),
        ),
        (_, Some(user)) => match requirement.role {
            Some(role) if role != user.role => Decision::Redirect(user.role.home().to_string()),
            _ => Decision::Allow,
        },
        (false, None) => Decision::Allow,
    }
}
