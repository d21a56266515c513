use axum::{
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

use crate::{
    authz::{self, Decision},
    backend::BackendState,
    config::AppConfig,
    gate::{ClientGate, GateState},
    models::User,
    session::{Session, TokenSlots},
};

/// Short-lived cookie, the only credential the edge gate can see.
pub const TOKEN_COOKIE: &str = "token";
/// Long-lived storage slot the identity is resolved from.
pub const STORAGE_COOKIE: &str = "portal_session";

const TOKEN_COOKIE_TTL: Duration = Duration::days(1);
const STORAGE_COOKIE_TTL: Duration = Duration::days(30);

/// Reads both token slots from the request cookies.
pub fn token_slots(jar: &CookieJar) -> TokenSlots {
    TokenSlots::new(
        jar.get(STORAGE_COOKIE).map(|c| c.value().to_string()),
        jar.get(TOKEN_COOKIE).map(|c| c.value().to_string()),
    )
}

/// Writes both token slots back, removing the cookie of every empty slot.
pub fn persist_tokens(jar: CookieJar, tokens: &TokenSlots, config: &AppConfig) -> CookieJar {
    let jar = write_slot(jar, TOKEN_COOKIE, tokens.cookie.as_deref(), TOKEN_COOKIE_TTL, config);
    write_slot(jar, STORAGE_COOKIE, tokens.stored.as_deref(), STORAGE_COOKIE_TTL, config)
}

fn write_slot(
    jar: CookieJar,
    name: &'static str,
    value: Option<&str>,
    ttl: Duration,
    config: &AppConfig,
) -> CookieJar {
    match value {
        Some(value) => jar.add(
            Cookie::build((name, value.to_string()))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .secure(config.cookie_secure)
                .max_age(ttl),
        ),
        None => jar.remove(Cookie::build(name).path("/")),
    }
}

/// edge_gate
///
/// Outermost authorization layer, run before routing. Only the path and the
/// presence of the `token` cookie are consulted.
pub async fn edge_gate(jar: CookieJar, request: Request, next: Next) -> Response {
    let decision = authz::edge_decision(
        request.uri().path(),
        request.uri().query(),
        jar.get(TOKEN_COOKIE).map(Cookie::value),
    );

    match decision {
        Decision::Redirect(target) => {
            tracing::debug!(path = %request.uri().path(), %target, "edge gate redirect");
            Redirect::temporary(&target).into_response()
        }
        Decision::Allow | Decision::Wait => next.run(request).await,
    }
}

/// AreaGuard
///
/// State of the client gate middleware for one page area.
#[derive(Clone)]
pub struct AreaGuard {
    pub backend: BackendState,
    pub config: AppConfig,
    pub gate: ClientGate,
}

impl AreaGuard {
    pub fn new(backend: BackendState, config: AppConfig, gate: ClientGate) -> Self {
        Self {
            backend,
            config,
            gate,
        }
    }
}

/// CurrentUser
///
/// The identity the client gate resolved, handed to handlers together with
/// the token to act on the backend with.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub token: String,
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(StatusCode::UNAUTHORIZED)
    }
}

/// client_gate
///
/// Per-area authorization layer. Resolves the identity behind the stored
/// token, then lets the area's `ClientGate` decide. Token slots cleared by a
/// failed resolution are written back on whatever response goes out.
pub async fn client_gate(
    State(guard): State<AreaGuard>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let mut session = Session::new(token_slots(&jar));
    let mut updates = session.subscribe();
    session.resolve(guard.backend.as_ref()).await;

    let verdict = guard.gate.settle(&mut updates).await;
    let jar = if session.tokens_changed() {
        persist_tokens(jar, session.tokens(), &guard.config)
    } else {
        jar
    };

    match verdict {
        GateState::Authorized => {
            if let (Some(user), Some(token)) = (session.user(), session.token()) {
                request.extensions_mut().insert(CurrentUser {
                    user,
                    token: token.to_string(),
                });
            }
            (jar, next.run(request).await).into_response()
        }
        GateState::Unauthorized { redirect } => {
            tracing::debug!(path = %request.uri().path(), %redirect, "client gate redirect");
            (jar, Redirect::temporary(&redirect)).into_response()
        }
        // Resolution has finished above, so this only renders the placeholder.
        GateState::Loading => (StatusCode::ACCEPTED, jar, "loading").into_response(),
    }
}
