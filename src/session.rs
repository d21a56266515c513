//! Session state: the token slots plus the resolved identity.
//!
//! A `Session` is owned by whoever drives it (a request, a test, a
//! long-lived client) and is only mutated through its own methods. Every
//! mutation is published on a `watch` channel so subscribers such as
//! [`crate::gate::ClientGate`] can re-evaluate.

use tokio::sync::watch;

use crate::{
    backend::Backend,
    error::PortalError,
    models::{LoginRequest, RegisterRequest, RegistrationForm, User},
    validation,
};

/// TokenSlots
///
/// The two places a session token lives: the long-lived storage slot used
/// for identity resolution, and the short-lived cookie the edge gate reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenSlots {
    pub stored: Option<String>,
    pub cookie: Option<String>,
}

impl TokenSlots {
    pub fn new(stored: Option<String>, cookie: Option<String>) -> Self {
        let non_empty = |value: Option<String>| value.filter(|v| !v.is_empty());
        Self {
            stored: non_empty(stored),
            cookie: non_empty(cookie),
        }
    }

    /// The token identity resolution uses.
    pub fn token(&self) -> Option<&str> {
        self.stored.as_deref()
    }

    fn store(&mut self, token: &str) {
        self.stored = Some(token.to_string());
        self.cookie = Some(token.to_string());
    }

    /// Re-issues the cookie from the storage slot. True when it was missing
    /// or stale.
    fn sync_cookie(&mut self) -> bool {
        if self.stored.is_none() || self.cookie == self.stored {
            return false;
        }
        self.cookie = self.stored.clone();
        true
    }

    fn clear(&mut self) {
        self.stored = None;
        self.cookie = None;
    }
}

/// AuthState
///
/// Snapshot published to subscribers. `loading` is true until the first
/// identity resolution finishes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthState {
    pub user: Option<User>,
    pub loading: bool,
}

pub struct Session {
    tokens: TokenSlots,
    tokens_changed: bool,
    state: watch::Sender<AuthState>,
}

impl Session {
    /// Starts in the loading state; call [`Session::resolve`] to settle it.
    pub fn new(tokens: TokenSlots) -> Self {
        let (state, _) = watch::channel(AuthState {
            user: None,
            loading: true,
        });
        Self {
            tokens,
            tokens_changed: false,
            state,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    pub fn token(&self) -> Option<&str> {
        self.tokens.token()
    }

    pub fn tokens(&self) -> &TokenSlots {
        &self.tokens
    }

    /// True once a login, registration, logout or resolution has touched the
    /// slots; the caller must then persist them.
    pub fn tokens_changed(&self) -> bool {
        self.tokens_changed
    }

    fn publish(&self, user: Option<User>, loading: bool) {
        self.state.send_replace(AuthState { user, loading });
    }

    /// Exchanges the stored token for an identity. A failed exchange clears
    /// the token and the user. A successful one restores an expired cookie
    /// slot, since the edge gate only sees the cookie. Loading ends either way.
    pub async fn resolve(&mut self, backend: &dyn Backend) {
        let Some(token) = self.tokens.token().map(str::to_owned) else {
            self.publish(None, false);
            return;
        };

        match backend.me(&token).await {
            Ok(user) => {
                let user = user.normalized();
                tracing::debug!(user_id = %user.id, role = ?user.role, "identity resolved");
                if self.tokens.sync_cookie() {
                    tracing::debug!("token cookie re-issued from the storage slot");
                    self.tokens_changed = true;
                }
                self.publish(Some(user), false);
            }
            Err(e) => {
                tracing::warn!(error = %e, "identity resolution failed, clearing token");
                self.tokens.clear();
                self.tokens_changed = true;
                self.publish(None, false);
            }
        }
    }

    pub async fn login(
        &mut self,
        backend: &dyn Backend,
        credentials: &LoginRequest,
    ) -> Result<User, PortalError> {
        let payload = backend.login(credentials).await?;
        Ok(self.establish(payload.user, &payload.token))
    }

    /// Validates locally before anything is sent.
    pub async fn register(
        &mut self,
        backend: &dyn Backend,
        form: &RegistrationForm,
    ) -> Result<User, PortalError> {
        validation::validate_registration(form)?;
        let payload = backend.register(&RegisterRequest::from(form)).await?;
        Ok(self.establish(payload.user, &payload.token))
    }

    fn establish(&mut self, user: User, token: &str) -> User {
        let user = user.normalized();
        self.tokens.store(token);
        self.tokens_changed = true;
        self.publish(Some(user.clone()), false);
        tracing::info!(user_id = %user.id, role = ?user.role, "session established");
        user
    }

    pub fn logout(&mut self) {
        self.tokens.clear();
        self.tokens_changed = true;
        self.publish(None, false);
    }

    /// Re-fetches the identity. Unlike [`Session::resolve`], a failure keeps
    /// the current state.
    pub async fn refresh(&mut self, backend: &dyn Backend) {
        let Some(token) = self.tokens.token().map(str::to_owned) else {
            return;
        };
        match backend.me(&token).await {
            Ok(user) => self.publish(Some(user.normalized()), false),
            Err(e) => tracing::error!(error = %e, "refreshing identity failed"),
        }
    }
}
