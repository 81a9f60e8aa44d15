//! Decides whether the authenticated workspace is shown at all.

use tracing::{debug, info};

use crate::api::WorkspaceBackend;
use crate::core::validation::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    pub authenticated: bool,
    pub email: Option<String>,
}

impl Session {
    pub fn signed_out() -> Self {
        Self::default()
    }
}

/// Asks the service for the current session. Transport and protocol failures
/// collapse into the signed-out session: the gate has exactly two outcomes.
pub async fn check_session(backend: &dyn WorkspaceBackend) -> Session {
    match backend.session_status().await {
        Ok(status) => Session {
            authenticated: status.authenticated,
            email: if status.authenticated {
                status.email
            } else {
                None
            },
        },
        Err(err) => {
            debug!(error = %err, "session check failed; treating as signed out");
            Session::signed_out()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateTransition {
    Unchanged,
    SignedIn,
    SignedOut,
}

#[derive(Debug, Default)]
pub struct LoginForm {
    pub email: String,
    busy: bool,
    error: Option<String>,
}

impl LoginForm {
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[derive(Debug, Default)]
pub struct SessionGate {
    session: Option<Session>,
    generation: u64,
    pub login: LoginForm,
}

impl SessionGate {
    pub fn new(login_email: Option<String>) -> Self {
        Self {
            login: LoginForm {
                email: login_email.unwrap_or_default(),
                ..LoginForm::default()
            },
            ..Self::default()
        }
    }

    /// `None` until the first check has completed.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_checking(&self) -> bool {
        self.session.is_none()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| session.authenticated)
    }

    pub fn email(&self) -> Option<&str> {
        self.session
            .as_ref()
            .and_then(|session| session.email.as_deref())
    }

    /// The previous snapshot stays in place while a re-check is in flight.
    pub fn begin_check(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    pub fn apply_check(&mut self, generation: u64, session: Session) -> GateTransition {
        if generation != self.generation {
            debug!(generation, "discarding stale session check");
            return GateTransition::Unchanged;
        }
        let was_authenticated = self.is_authenticated();
        let now_authenticated = session.authenticated;
        info!(authenticated = now_authenticated, "session checked");
        self.session = Some(session);

        match (was_authenticated, now_authenticated) {
            (false, true) => GateTransition::SignedIn,
            (true, false) => GateTransition::SignedOut,
            _ => GateTransition::Unchanged,
        }
    }

    pub fn begin_login(&mut self, email: &str, password: &str) -> Result<(), ValidationError> {
        if self.login.busy {
            return Err(ValidationError::LoginInProgress);
        }
        if email.trim().is_empty() || password.is_empty() {
            return Err(ValidationError::MissingCredentials);
        }
        self.login.email = email.to_string();
        self.login.busy = true;
        self.login.error = None;
        Ok(())
    }

    /// Returns `true` when the credentials were accepted and the session
    /// should be checked again.
    pub fn finish_login(&mut self, result: Result<Option<String>, String>) -> bool {
        self.login.busy = false;
        match result {
            Ok(None) => true,
            Ok(Some(message)) | Err(message) => {
                self.login.error = Some(message);
                false
            }
        }
    }
}
