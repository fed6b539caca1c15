//! Auth session state machine
//!
//! Screen selection is an explicit finite state machine driven by a pure
//! in-place reducer: network completions and user actions arrive as
//! [`AuthEvent`]s, and each one lands in exactly one of four outcomes: a
//! session, a pending login hint, a display error, or a plain screen
//! switch.

use serde::Deserialize;

use crate::api::AuthRejection;

/// The authenticated identity returned by the auth endpoints.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
}

/// Token plus user. Held as one unit so the two are created and
/// destroyed atomically; a `Session` that exists is valid.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// Transient form credentials. Held only while a screen is editing them,
/// never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Credentials {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Prefill carried from a registration that hit an existing account to
/// the login screen.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingLoginHint {
    pub email: String,
    pub password: String,
}

/// Which screen is live. The hint lives inside `LoggingIn` so it cannot
/// outlive the only state in which it means anything.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthScreen {
    Registering,
    LoggingIn { hint: Option<PendingLoginHint> },
    Authenticated { session: Session },
}

/// Completions of the auth calls plus the two user-initiated switches.
#[derive(Debug)]
pub enum AuthEvent {
    RegisterSucceeded(Session),
    RegisterFailed {
        rejection: AuthRejection,
        attempted: Credentials,
    },
    LoginSucceeded(Session),
    LoginFailed(AuthRejection),
    SwitchToLogin,
    SwitchToRegister,
}

/// Screen selection plus the display error for the active screen.
#[derive(Debug)]
pub struct AuthFlow {
    pub screen: AuthScreen,
    pub error: Option<String>,
}

impl Default for AuthFlow {
    fn default() -> Self {
        Self {
            screen: AuthScreen::Registering,
            error: None,
        }
    }
}

impl AuthFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> Option<&Session> {
        match &self.screen {
            AuthScreen::Authenticated { session } => Some(session),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session().is_some()
    }

    /// Apply one event. `Authenticated` is terminal: anything arriving
    /// after it (a stale completion, a stray switch) is ignored.
    pub fn apply(&mut self, event: AuthEvent) {
        if self.is_authenticated() {
            return;
        }
        match event {
            AuthEvent::RegisterSucceeded(session) | AuthEvent::LoginSucceeded(session) => {
                self.error = None;
                self.screen = AuthScreen::Authenticated { session };
            }
            AuthEvent::RegisterFailed {
                rejection: AuthRejection::AccountExists,
                attempted,
            } => {
                self.error = None;
                self.screen = AuthScreen::LoggingIn {
                    hint: Some(PendingLoginHint {
                        email: attempted.email,
                        password: attempted.password,
                    }),
                };
            }
            AuthEvent::RegisterFailed { rejection, .. } => {
                self.error = Some(rejection.to_string());
            }
            AuthEvent::LoginFailed(rejection) => {
                self.error = Some(rejection.to_string());
            }
            AuthEvent::SwitchToLogin => {
                self.error = None;
                self.screen = AuthScreen::LoggingIn { hint: None };
            }
            AuthEvent::SwitchToRegister => {
                self.error = None;
                self.screen = AuthScreen::Registering;
            }
        }
    }
}
