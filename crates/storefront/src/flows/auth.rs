//! Register, login and logout.

use std::sync::Arc;

use secrecy::SecretString;
use tracing::{info, instrument};

use qkart_core::{LoginForm, RegistrationForm, validate_login, validate_registration};

use super::messages;
use crate::api::ApiClient;
use crate::error::{
    FlowError, Result, ServerMessage, add_breadcrumb, clear_sentry_user, report, set_sentry_user,
};
use crate::notify::{Notification, Notifier};
use crate::session::Session;

/// Account operations.
pub struct AuthFlow {
    client: ApiClient,
    notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for AuthFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthFlow")
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}

impl AuthFlow {
    #[must_use]
    pub fn new(client: ApiClient, notifier: Arc<dyn Notifier>) -> Self {
        Self { client, notifier }
    }

    /// Create an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the form is invalid or the service refuses it.
    #[instrument(skip_all, fields(username = %form.username))]
    pub async fn register(&mut self, form: &RegistrationForm) -> Result<()> {
        if let Err(e) = validate_registration(form) {
            self.notifier.notify(Notification::warning(e.to_string()));
            return Err(e.into());
        }

        let username = form.username.as_str();
        self.client
            .register(username, &form.password)
            .await
            .map_err(|e| self.auth_failed(e))?;

        add_breadcrumb("auth", "Registered", Some(&[("username", username)]));
        self.notifier
            .notify(Notification::success(messages::REGISTERED));
        info!(username, "Registered");
        Ok(())
    }

    /// Log in and fill the session with the token, username and balance.
    ///
    /// # Errors
    ///
    /// Returns an error if the form is invalid or the credentials are wrong.
    #[instrument(skip_all, fields(username = %form.username))]
    pub async fn login(&mut self, form: &LoginForm, session: &mut Session) -> Result<()> {
        if let Err(e) = validate_login(form) {
            self.notifier.notify(Notification::warning(e.to_string()));
            return Err(e.into());
        }

        let response = self
            .client
            .login(&form.username, &form.password)
            .await
            .map_err(|e| self.auth_failed(e))?;

        *session = Session::logged_in(
            SecretString::from(response.token),
            response.username.clone(),
            response.balance,
        );
        set_sentry_user(&response.username);
        self.notifier
            .notify(Notification::success(messages::LOGGED_IN));
        info!(username = %response.username, balance = response.balance, "Logged in");
        Ok(())
    }

    /// Forget the session.
    pub fn logout(&mut self, session: &mut Session) {
        if let Some(username) = session.username() {
            info!(username, "Logged out");
        }
        session.clear();
        clear_sentry_user();
        self.notifier
            .notify(Notification::info(messages::LOGGED_OUT));
    }

    fn auth_failed(&self, err: crate::api::ApiError) -> FlowError {
        report(&*self.notifier, &err, messages::AUTH, ServerMessage::OnStatus(400));
        err.into()
    }
}
