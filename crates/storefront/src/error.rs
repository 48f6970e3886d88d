//! Unified error handling with Sentry integration.
//!
//! Every flow operation returns `Result<T, FlowError>`. Before returning an
//! error, the flow has already told the user about it through its
//! [`Notifier`](crate::notify::Notifier); the error value is for the caller's
//! control flow (exit codes, retries by the user).

use thiserror::Error;

use qkart_core::{AddressId, CheckoutError, LoginError, ProductId, RegistrationError};

use crate::api::ApiError;
use crate::notify::{Notification, Notifier};
use crate::session::SessionError;

/// Flow-level error type for the storefront.
#[derive(Debug, Error)]
pub enum FlowError {
    /// Remote service call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Session file could not be read or written.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Registration form rejected locally.
    #[error("Invalid registration: {0}")]
    Registration(#[from] RegistrationError),

    /// Login form rejected locally.
    #[error("Invalid login: {0}")]
    Login(#[from] LoginError),

    /// Checkout preconditions not met.
    #[error("Checkout rejected: {0}")]
    Checkout(#[from] CheckoutError),

    /// Operation needs a logged-in session.
    #[error("Not logged in")]
    NotLoggedIn,

    /// Product is already in the cart.
    #[error("Product already in cart: {0}")]
    AlreadyInCart(ProductId),

    /// Product is not in the current catalog.
    #[error("Unknown product: {0}")]
    UnknownProduct(ProductId),

    /// Address is not among the saved addresses.
    #[error("Unknown address: {0}")]
    UnknownAddress(AddressId),
}

/// Result type alias for `FlowError`.
pub type Result<T> = std::result::Result<T, FlowError>;

/// When a server's own `message` should be shown instead of the fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerMessage {
    /// Always use the fallback text.
    Never,
    /// Use the server's message only for this status code.
    OnStatus(u16),
    /// Use the server's message for any 4xx status.
    OnClientError,
    /// Use the server's message whenever the server answered.
    Always,
}

/// Pick the text to show the user for a failed API call.
#[must_use]
pub fn describe(err: &ApiError, fallback: &str, policy: ServerMessage) -> String {
    let server = match policy {
        ServerMessage::Never => None,
        ServerMessage::OnStatus(status) if err.status() == Some(status) => err.server_message(),
        ServerMessage::OnStatus(_) => None,
        ServerMessage::OnClientError if err.status().is_some_and(|s| (400..500).contains(&s)) => {
            err.server_message()
        }
        ServerMessage::OnClientError => None,
        ServerMessage::Always => err.server_message(),
    };
    server.unwrap_or(fallback).to_string()
}

/// Tell the user about a failed API call and log it.
///
/// Connectivity and parse failures are captured to Sentry; server
/// rejections are expected and only logged.
pub fn report(notifier: &dyn Notifier, err: &ApiError, fallback: &str, policy: ServerMessage) {
    if err.is_connectivity() {
        let event_id = sentry::capture_error(err);
        tracing::error!(
            error = %err,
            sentry_event_id = %event_id,
            "QKart API unreachable"
        );
    } else {
        tracing::warn!(error = %err, "QKart API rejected request");
    }

    notifier.notify(Notification::error(describe(err, fallback, policy)));
}

/// Set the Sentry user context after a successful login.
pub fn set_sentry_user(username: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            username: Some(username.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user
/// actions leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Quantity changed", Some(&[("product_id", "p1"), ("change", "add")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
