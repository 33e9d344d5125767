use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Detailed authentication error information
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    Network(String),
    InvalidCredential,
    AlreadyRegistered,
    AccountNotFound,
    Unknown(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "network failure: {}", msg),
            Self::InvalidCredential => write!(f, "invalid email or password"),
            Self::AlreadyRegistered => write!(f, "account already registered"),
            Self::AccountNotFound => write!(f, "account not found"),
            Self::Unknown(msg) => write!(f, "{}", msg),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("authentication failed: {0}")]
    Auth(AuthError),

    #[error("not logged in")]
    NotLoggedIn,

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("service error {code}: {message}")]
    Api { code: String, message: String },

    #[error("cloud script '{function}' failed: {message}")]
    Script { function: String, message: String },

    #[error("invalid response from server: {0}")]
    InvalidServerResponse(String),

    #[error("preference storage error: {0}")]
    PreferenceStorage(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Folds a non-auth failure from an identity call into the auth taxonomy.
    pub fn into_auth(self) -> AuthError {
        match self {
            Error::Auth(e) => e,
            Error::Network(msg) => AuthError::Network(msg),
            Error::Timeout(after) => AuthError::Network(format!("timed out after {:?}", after)),
            other => AuthError::Unknown(other.to_string()),
        }
    }
}

impl From<AuthError> for Error {
    fn from(e: AuthError) -> Self {
        Error::Auth(e)
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}
