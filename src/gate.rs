use tokio::sync::watch;

use crate::{
    authz::{self, Decision, Identity, Requirement},
    models::Role,
    session::AuthState,
};

/// GateState
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState {
    Loading,
    Authorized,
    Unauthorized { redirect: String },
}

/// ClientGate
///
/// Guards one page area against the session's resolved identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientGate {
    requirement: Requirement,
}

impl ClientGate {
    pub fn new(requirement: Requirement) -> Self {
        Self { requirement }
    }

    /// Guest-only area (login, register).
    pub fn guest() -> Self {
        Self::new(Requirement::default())
    }

    /// Guest-only area that sends signed-in visitors to a fixed target.
    pub fn guest_redirecting_to(target: impl Into<String>) -> Self {
        Self::new(Requirement {
            redirect_to: Some(target.into()),
            ..Requirement::default()
        })
    }

    /// Any signed-in user.
    pub fn signed_in() -> Self {
        Self::new(Requirement {
            require_auth: true,
            ..Requirement::default()
        })
    }

    pub fn role(role: Role) -> Self {
        Self::new(Requirement {
            require_auth: true,
            role: Some(role),
            redirect_to: None,
        })
    }

    pub fn requirement(&self) -> &Requirement {
        &self.requirement
    }

    pub fn evaluate(&self, state: &AuthState) -> GateState {
        let identity = match (&state.user, state.loading) {
            (_, true) => Identity::Pending,
            (None, false) => Identity::Anonymous,
            (Some(user), false) => Identity::Resolved(user),
        };
        match authz::client_decision(identity, &self.requirement) {
            Decision::Wait => GateState::Loading,
            Decision::Allow => GateState::Authorized,
            Decision::Redirect(redirect) => GateState::Unauthorized { redirect },
        }
    }

    /// Waits until the session leaves the loading state and returns the
    /// verdict. If the session is dropped while loading, the last snapshot
    /// decides.
    pub async fn settle(&self, updates: &mut watch::Receiver<AuthState>) -> GateState {
        loop {
            let verdict = self.evaluate(&updates.borrow_and_update());
            if verdict != GateState::Loading {
                return verdict;
            }
            if updates.changed().await.is_err() {
                return self.evaluate(&updates.borrow());
            }
        }
    }

    /// Waits for the next session change and re-evaluates. `None` once the
    /// session is gone.
    pub async fn next_change(&self, updates: &mut watch::Receiver<AuthState>) -> Option<GateState> {
        updates.changed().await.ok()?;
        Some(self.evaluate(&updates.borrow_and_update()))
    }
}
