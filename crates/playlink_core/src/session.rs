//! Shared session state.
//!
//! Authentication attempts are serialized through an async gate: a second
//! login waits until the first one has settled, so the stored session is
//! always the one from the last completed attempt.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::entities::{Session, SessionState};
use crate::error::Error;

#[derive(Debug, Default)]
struct Current {
    state: SessionState,
    session: Option<Session>,
}

/// Process-wide session context, shared by the clients through an `Arc`
#[derive(Debug, Default)]
pub struct SessionContext {
    current: RwLock<Current>,
    auth_gate: Mutex<()>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.read().state
    }

    pub fn session(&self) -> Option<Session> {
        self.read().session.clone()
    }

    /// Current session, only while logged in
    pub fn require_session(&self) -> Result<Session, Error> {
        let current = self.read();
        match (&current.state, &current.session) {
            (SessionState::LoggedIn, Some(session)) => Ok(session.clone()),
            _ => Err(Error::NotLoggedIn),
        }
    }

    /// Wait for any in-flight attempt, then enter `Authenticating`.
    pub async fn begin_auth(&self) -> AuthAttempt<'_> {
        let gate = self.auth_gate.lock().await;
        self.write().state = SessionState::Authenticating;
        debug!("authentication attempt started");
        AuthAttempt {
            context: self,
            _gate: gate,
            settled: false,
        }
    }

    /// Drop the session and return to `LoggedOut`.
    pub async fn end(&self) {
        let _gate = self.auth_gate.lock().await;
        let mut current = self.write();
        current.state = SessionState::LoggedOut;
        current.session = None;
    }

    fn read(&self) -> RwLockReadGuard<'_, Current> {
        self.current.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Current> {
        self.current.write().unwrap_or_else(|e| e.into_inner())
    }
}

/// Exclusive authentication attempt.
///
/// Dropping it unsettled counts as a failure.
pub struct AuthAttempt<'a> {
    context: &'a SessionContext,
    _gate: MutexGuard<'a, ()>,
    settled: bool,
}

impl AuthAttempt<'_> {
    pub fn succeed(mut self, session: Session) {
        let mut current = self.context.write();
        current.state = SessionState::LoggedIn;
        current.session = Some(session);
        self.settled = true;
    }

    pub fn fail(mut self) {
        self.reset();
        self.settled = true;
    }

    fn reset(&self) {
        let mut current = self.context.write();
        current.state = SessionState::LoggedOut;
        current.session = None;
    }
}

impl Drop for AuthAttempt<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.reset();
        }
    }
}
