mod common;

use common::{ADMIN_TOKEN, PASSWORD, STUDENT_TOKEN, StubBackend, student};
use edu_portal::{
    error::{ErrorCategory, PortalError},
    gate::{ClientGate, GateState},
    models::{LoginRequest, RegistrationForm, Role},
    session::{AuthState, Session, TokenSlots},
};
use tokio::test;

fn slots(token: &str) -> TokenSlots {
    TokenSlots::new(Some(token.to_string()), Some(token.to_string()))
}

fn registration(confirm: &str) -> RegistrationForm {
    RegistrationForm {
        full_name: "New Student".to_string(),
        email: "new@school.edu".to_string(),
        password: "secret1".to_string(),
        confirm_password: confirm.to_string(),
        program_id: None,
    }
}

// --- Session ---

#[test]
async fn test_empty_slots_are_dropped() {
    let tokens = TokenSlots::new(Some(String::new()), None);
    assert_eq!(tokens, TokenSlots::default());
    assert_eq!(tokens.token(), None);
}

#[test]
async fn test_new_session_is_loading() {
    let session = Session::new(TokenSlots::default());
    assert_eq!(
        session.state(),
        AuthState {
            user: None,
            loading: true
        }
    );
}

#[test]
async fn test_resolve_without_token_skips_backend() {
    let backend = StubBackend::with_sessions();
    let mut session = Session::new(TokenSlots::default());

    session.resolve(&backend).await;

    assert_eq!(backend.me_calls(), 0);
    assert!(!session.state().loading);
    assert!(session.user().is_none());
    assert!(!session.tokens_changed());
}

#[test]
async fn test_resolve_with_valid_token() {
    let backend = StubBackend::with_sessions();
    let mut session = Session::new(slots(STUDENT_TOKEN));

    session.resolve(&backend).await;

    let user = session.user().expect("student resolved");
    assert_eq!(user.role, Role::Student);
    assert_eq!(session.token(), Some(STUDENT_TOKEN));
    assert!(!session.tokens_changed());
}

#[test]
async fn test_resolve_reissues_missing_cookie() {
    let backend = StubBackend::with_sessions();
    let mut session = Session::new(TokenSlots::new(Some(ADMIN_TOKEN.to_string()), None));

    session.resolve(&backend).await;

    assert_eq!(session.user().map(|u| u.role), Some(Role::Admin));
    assert!(session.tokens_changed());
    assert_eq!(session.tokens().cookie.as_deref(), Some(ADMIN_TOKEN));
    assert_eq!(session.tokens().stored.as_deref(), Some(ADMIN_TOKEN));
}

#[test]
async fn test_resolve_replaces_stale_cookie() {
    let backend = StubBackend::with_sessions();
    let mut session = Session::new(TokenSlots::new(
        Some(STUDENT_TOKEN.to_string()),
        Some("old-token".to_string()),
    ));

    session.resolve(&backend).await;

    assert!(session.tokens_changed());
    assert_eq!(session.tokens().cookie.as_deref(), Some(STUDENT_TOKEN));
}

#[test]
async fn test_failed_resolution_clears_both_slots() {
    let backend = StubBackend::with_sessions();
    let mut session = Session::new(slots("expired"));

    session.resolve(&backend).await;

    assert!(session.user().is_none());
    assert!(!session.state().loading);
    assert_eq!(session.tokens(), &TokenSlots::default());
    assert!(session.tokens_changed());
}

#[test]
async fn test_login_stores_token_in_both_slots() {
    let backend = StubBackend::with_sessions();
    let mut session = Session::new(TokenSlots::default());

    let user = session
        .login(
            &backend,
            &LoginRequest {
                email: "admin@school.edu".to_string(),
                password: PASSWORD.to_string(),
            },
        )
        .await
        .expect("login succeeds");

    assert_eq!(user.role, Role::Admin);
    assert_eq!(session.tokens(), &slots(ADMIN_TOKEN));
    assert!(session.tokens_changed());
}

#[test]
async fn test_bad_credentials_leave_session_untouched() {
    let backend = StubBackend::with_sessions();
    let mut session = Session::new(TokenSlots::default());

    let err = session
        .login(
            &backend,
            &LoginRequest {
                email: "admin@school.edu".to_string(),
                password: "wrong".to_string(),
            },
        )
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Invalid credentials");
    assert_eq!(err.category(), ErrorCategory::Network);
    assert!(!session.tokens_changed());
}

#[test]
async fn test_mismatched_registration_never_reaches_backend() {
    let backend = StubBackend::with_sessions();
    let mut session = Session::new(TokenSlots::default());

    let err = session
        .register(&backend, &registration("other"))
        .await
        .unwrap_err();

    assert!(matches!(err, PortalError::Validation(_)));
    assert_eq!(backend.register_calls(), 0);
    assert!(session.user().is_none());
}

#[test]
async fn test_registration_signs_in() {
    let backend = StubBackend::with_sessions();
    let mut session = Session::new(TokenSlots::default());

    let user = session
        .register(&backend, &registration("secret1"))
        .await
        .expect("registration succeeds");

    assert_eq!(user.role, Role::Student);
    assert_eq!(backend.register_calls(), 1);
    assert_eq!(session.token(), Some("fresh-token"));
}

#[test]
async fn test_logout_clears_slots_and_notifies() {
    let backend = StubBackend::with_sessions();
    let mut session = Session::new(slots(STUDENT_TOKEN));
    session.resolve(&backend).await;
    let mut updates = session.subscribe();
    updates.mark_unchanged();

    session.logout();

    assert!(updates.has_changed().unwrap());
    assert!(updates.borrow_and_update().user.is_none());
    assert_eq!(session.tokens(), &TokenSlots::default());
}

#[test]
async fn test_refresh_failure_keeps_user() {
    let mut backend = StubBackend::with_sessions();
    let mut session = Session::new(slots(STUDENT_TOKEN));
    session.resolve(&backend).await;

    backend.sessions.clear();
    session.refresh(&backend).await;

    assert_eq!(session.user(), Some(student()));
    assert_eq!(session.token(), Some(STUDENT_TOKEN));
}

// --- Client gate ---

#[test]
async fn test_gate_loading_never_redirects() {
    let gate = ClientGate::role(Role::Admin);
    let state = AuthState {
        user: None,
        loading: true,
    };
    assert_eq!(gate.evaluate(&state), GateState::Loading);
}

#[test]
async fn test_gate_settles_after_resolution() {
    let backend = StubBackend::with_sessions();
    let mut session = Session::new(slots(STUDENT_TOKEN));
    let mut updates = session.subscribe();
    let gate = ClientGate::role(Role::Admin);

    session.resolve(&backend).await;

    assert_eq!(
        gate.settle(&mut updates).await,
        GateState::Unauthorized {
            redirect: "/student/dashboard".to_string()
        }
    );
}

#[test]
async fn test_gate_follows_session_changes() {
    let backend = StubBackend::with_sessions();
    let mut session = Session::new(slots(STUDENT_TOKEN));
    let mut updates = session.subscribe();
    let gate = ClientGate::signed_in();

    session.resolve(&backend).await;
    assert_eq!(gate.settle(&mut updates).await, GateState::Authorized);

    session.logout();
    assert_eq!(
        gate.next_change(&mut updates).await,
        Some(GateState::Unauthorized {
            redirect: "/login".to_string()
        })
    );

    drop(session);
    assert_eq!(gate.next_change(&mut updates).await, None);
}

#[test]
async fn test_guest_gate_sends_signed_in_users_home() {
    let backend = StubBackend::with_sessions();
    let mut session = Session::new(slots(ADMIN_TOKEN));
    let mut updates = session.subscribe();
    session.resolve(&backend).await;

    assert_eq!(
        ClientGate::guest().settle(&mut updates).await,
        GateState::Unauthorized {
            redirect: "/admin/dashboard".to_string()
        }
    );
    assert_eq!(
        ClientGate::guest_redirecting_to("/redirect")
            .settle(&mut updates)
            .await,
        GateState::Unauthorized {
            redirect: "/redirect".to_string()
        }
    );
}
