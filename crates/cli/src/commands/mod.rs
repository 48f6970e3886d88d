//! Command implementations.
//!
//! Each command builds the flow it needs from a shared [`Context`], runs
//! one operation, and prints the result. Flows have already told the user
//! what went wrong by the time a command sees an error.

pub mod account;
pub mod addresses;
pub mod cart;
pub mod catalog;
pub mod checkout;

use std::sync::Arc;

use thiserror::Error;

use qkart_core::ProductId;
use qkart_storefront::api::{ApiClient, ApiError};
use qkart_storefront::config::StorefrontConfig;
use qkart_storefront::error::FlowError;
use qkart_storefront::notify::{LogNotifier, Notifier};
use qkart_storefront::session::{Session, SessionError, SessionStore};

use crate::output::TerminalNotifier;

/// Errors a command can end with.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Flow(#[from] FlowError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Could not read input: {0}")]
    Io(#[from] std::io::Error),

    #[error("Product is not in the cart: {0}")]
    NotInCart(ProductId),
}

/// Everything a command needs: configuration, the API client, and the
/// session loaded from disk.
#[derive(Debug)]
pub struct Context {
    pub config: StorefrontConfig,
    pub client: ApiClient,
    pub store: SessionStore,
    pub session: Session,
    quiet: bool,
}

impl Context {
    /// Build the client and load the saved session. With `quiet`,
    /// notifications go to the log instead of the terminal.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client can't be built or the session file
    /// is unreadable.
    pub fn new(config: StorefrontConfig, quiet: bool) -> Result<Self, CommandError> {
        let client = ApiClient::new(&config.backend)?;
        let store = SessionStore::new(config.session_path.clone());
        let session = store.load()?;

        if let Some(username) = session.username() {
            tracing::debug!(username, "Loaded session");
        }

        Ok(Self {
            config,
            client,
            store,
            session,
            quiet,
        })
    }

    #[must_use]
    pub fn notifier(&self) -> Arc<dyn Notifier> {
        notifier_for(self.quiet)
    }

    /// Write the session back to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the session file can't be written.
    pub fn save_session(&self) -> Result<(), CommandError> {
        self.store.save(&self.session)?;
        Ok(())
    }
}

fn notifier_for(quiet: bool) -> Arc<dyn Notifier> {
    if quiet {
        Arc::new(LogNotifier)
    } else {
        Arc::new(TerminalNotifier)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io;
    use std::sync::Mutex;

    use qkart_storefront::notify::Notification;

    use super::*;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_quiet_notifications_are_logged() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            notifier_for(true).notify(Notification::warning("Item already in cart"));
            notifier_for(true).notify(Notification::success("Address added"));
        });

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("WARN"));
        assert!(output.contains("Item already in cart"));
        assert!(output.contains("variant=success"));
        assert!(output.contains("Address added"));
    }
}
