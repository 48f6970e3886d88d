//! Register, login and logout against the in-process backend.

#![allow(clippy::indexing_slicing)]

use std::sync::Arc;

use qkart_core::{LoginForm, RegistrationError, RegistrationForm};
use qkart_integration_tests::{Canned, FakeBackend, STARTING_BALANCE};
use qkart_storefront::error::FlowError;
use qkart_storefront::flows::{AuthFlow, messages};
use qkart_storefront::notify::{RecordingNotifier, Variant};
use qkart_storefront::session::Session;
use secrecy::ExposeSecret;

fn registration(username: &str, password: &str, confirm: &str) -> RegistrationForm {
    RegistrationForm {
        username: username.to_string(),
        password: password.to_string(),
        confirm_password: confirm.to_string(),
    }
}

fn login_form(username: &str, password: &str) -> LoginForm {
    LoginForm {
        username: username.to_string(),
        password: password.to_string(),
    }
}

#[tokio::test]
async fn test_register_then_login() {
    let backend = FakeBackend::new().start().await;
    let notifier = Arc::new(RecordingNotifier::new());
    let mut flow = AuthFlow::new(backend.client(), notifier.clone());
    let mut session = Session::default();

    flow.register(&registration("crio-user", "learnbydoing", "learnbydoing"))
        .await
        .expect("Failed to register");
    flow.login(&login_form("crio-user", "learnbydoing"), &mut session)
        .await
        .expect("Failed to log in");

    assert!(session.is_logged_in());
    assert_eq!(session.username(), Some("crio-user"));
    assert!((session.balance() - STARTING_BALANCE).abs() < f64::EPSILON);
    assert_eq!(
        session.token().map(|token| token.expose_secret()),
        Some("token-crio-user")
    );
    assert_eq!(
        notifier.messages(),
        vec![messages::REGISTERED, messages::LOGGED_IN]
    );
}

#[tokio::test]
async fn test_register_validation_issues_no_request() {
    let backend = FakeBackend::new().start().await;
    let notifier = Arc::new(RecordingNotifier::new());
    let mut flow = AuthFlow::new(backend.client(), notifier.clone());

    let result = flow
        .register(&registration("crio-user", "learnbydoing", "learnbydoin"))
        .await;

    assert!(matches!(
        result,
        Err(FlowError::Registration(RegistrationError::PasswordMismatch))
    ));
    let last = notifier.last().expect("a warning");
    assert_eq!(last.variant, Variant::Warning);
    assert_eq!(last.message, "Passwords do not match");
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_register_taken_shows_server_message() {
    let backend = FakeBackend::new()
        .account("crio-user", "learnbydoing", 5000.0)
        .start()
        .await;
    let notifier = Arc::new(RecordingNotifier::new());
    let mut flow = AuthFlow::new(backend.client(), notifier.clone());

    let result = flow
        .register(&registration("crio-user", "learnbydoing", "learnbydoing"))
        .await;

    assert!(matches!(result, Err(FlowError::Api(_))));
    assert_eq!(
        notifier.last().expect("an error").message,
        "Username is already taken"
    );
}

#[tokio::test]
async fn test_register_server_error_is_generic() {
    let backend = FakeBackend::new().start().await;
    backend.respond_with(
        "POST",
        "/auth/register",
        Canned::status(500, "Internal Server Error"),
    );
    let notifier = Arc::new(RecordingNotifier::new());
    let mut flow = AuthFlow::new(backend.client(), notifier.clone());

    let result = flow
        .register(&registration("crio-user", "learnbydoing", "learnbydoing"))
        .await;

    assert!(result.is_err());
    assert_eq!(notifier.messages(), vec![messages::AUTH]);
}

#[tokio::test]
async fn test_wrong_password_leaves_session_alone() {
    let backend = FakeBackend::new()
        .account("crio-user", "learnbydoing", 5000.0)
        .start()
        .await;
    let notifier = Arc::new(RecordingNotifier::new());
    let mut flow = AuthFlow::new(backend.client(), notifier.clone());
    let mut session = Session::default();

    let result = flow
        .login(&login_form("crio-user", "wrong-password"), &mut session)
        .await;

    assert!(result.is_err());
    assert!(!session.is_logged_in());
    assert_eq!(
        notifier.last().expect("an error").message,
        "Password is incorrect"
    );
}

#[tokio::test]
async fn test_logout_clears_session() {
    let backend = FakeBackend::new()
        .account("crio-user", "learnbydoing", 5000.0)
        .start()
        .await;
    let mut flow = AuthFlow::new(backend.client(), Arc::new(RecordingNotifier::new()));
    let mut session = Session::default();
    flow.login(&login_form("crio-user", "learnbydoing"), &mut session)
        .await
        .expect("Failed to log in");

    flow.logout(&mut session);

    assert!(!session.is_logged_in());
    assert!(session.balance().abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_password_sent_as_typed() {
    let backend = FakeBackend::new()
        .account("crio-user", " learnbydoing ", 5000.0)
        .start()
        .await;
    let mut flow = AuthFlow::new(backend.client(), Arc::new(RecordingNotifier::new()));
    let mut session = Session::default();

    flow.login(&login_form("crio-user", " learnbydoing "), &mut session)
        .await
        .expect("Failed to log in");

    assert!(session.is_logged_in());
    assert_eq!(
        backend.requests_to("POST", "/auth/login")[0].body,
        Some(serde_json::json!({ "username": "crio-user", "password": " learnbydoing " }))
    );
}

#[tokio::test]
async fn test_register_mismatch_with_trailing_space() {
    let backend = FakeBackend::new().start().await;
    let notifier = Arc::new(RecordingNotifier::new());
    let mut flow = AuthFlow::new(backend.client(), notifier.clone());

    let result = flow
        .register(&registration("crio-user", "learnbydoing ", "learnbydoing"))
        .await;

    assert!(matches!(
        result,
        Err(FlowError::Registration(RegistrationError::PasswordMismatch))
    ));
    assert!(backend.requests().is_empty());
}
