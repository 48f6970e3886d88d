//! Client-held session state.
//!
//! The session carries the bearer token issued at login, the username, and
//! the cached wallet balance. It is an explicit value handed to each flow;
//! [`SessionStore`] reads and writes it as a JSON file between runs.

use std::io::Write;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reading or writing the session file.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session file I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Session file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Session state for the current user.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone, Default)]
pub struct Session {
    token: Option<SecretString>,
    username: Option<String>,
    balance: f64,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("username", &self.username)
            .field("balance", &self.balance)
            .finish()
    }
}

impl Session {
    /// A logged-in session.
    #[must_use]
    pub fn logged_in(token: SecretString, username: impl Into<String>, balance: f64) -> Self {
        Self {
            token: Some(token),
            username: Some(username.into()),
            balance,
        }
    }

    /// Bearer token, if logged in.
    #[must_use]
    pub const fn token(&self) -> Option<&SecretString> {
        self.token.as_ref()
    }

    /// Username, if logged in.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Cached wallet balance.
    #[must_use]
    pub const fn balance(&self) -> f64 {
        self.balance
    }

    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        self.token.is_some()
    }

    /// Record a completed purchase by lowering the cached balance.
    pub fn debit(&mut self, amount: f64) {
        self.balance -= amount;
    }

    /// Forget everything (logout).
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// On-disk form of [`Session`].
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredSession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    username: Option<String>,
    #[serde(default)]
    balance: f64,
}

/// Reads and writes the session as a JSON file.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the session. A missing file is an empty (logged-out) session.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but can't be read or parsed.
    pub fn load(&self) -> Result<Session, SessionError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Session::default()),
            Err(e) => return Err(e.into()),
        };

        let stored: StoredSession = serde_json::from_str(&content)?;
        Ok(Session {
            token: stored.token.map(SecretString::from),
            username: stored.username,
            balance: stored.balance,
        })
    }

    /// Write the session, replacing any previous one.
    ///
    /// The file is written next to its destination and renamed into place,
    /// so readers see either the old session or the new one. On unix it is
    /// only readable by the owner.
    ///
    /// # Errors
    ///
    /// Returns an error if the file can't be written.
    pub fn save(&self, session: &Session) -> Result<(), SessionError> {
        let stored = StoredSession {
            token: session.token.as_ref().map(|t| t.expose_secret().to_string()),
            username: session.username.clone(),
            balance: session.balance,
        };
        let json = serde_json::to_vec_pretty(&stored)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        // Created with mode 0600 on unix
        let mut file = tempfile::NamedTempFile::new_in(dir)?;
        file.write_all(&json)?;
        file.as_file().sync_all()?;
        file.persist(&self.path).map_err(|e| e.error)?;

        tracing::debug!(path = %self.path.display(), "Session saved");
        Ok(())
    }
}
