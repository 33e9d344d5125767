use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Email/password pair used for login and registration.
///
/// Persisted in plaintext by the credential store; only `email` and
/// `password` survive a restart.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
}

impl Credential {
    pub fn new(email: String, password: String) -> Self {
        Self {
            email,
            password,
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, display_name: String) -> Self {
        self.display_name = Some(display_name);
        self
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("display_name", &self.display_name)
            .finish()
    }
}

/// Statistics tracked for the player
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayerStats {
    pub money: f64,
    pub shafts: i32,
}

impl PlayerStats {
    pub fn new(money: f64, shafts: i32) -> Self {
        Self { money, shafts }
    }

    /// Money as transmitted: truncated toward zero, saturating at the i32
    /// range, NaN as 0.
    pub fn money_value(&self) -> i32 {
        self.money as i32
    }

    /// Batch of named updates covering every tracked stat.
    pub fn to_updates(&self) -> Vec<StatisticValue> {
        vec![
            StatisticValue::new(StatName::Money, self.money_value()),
            StatisticValue::new(StatName::Shafts, self.shafts),
        ]
    }

    /// Overwrite the field matching `stat`. Returns false when the name is
    /// not tracked, leaving the stats untouched.
    pub fn apply(&mut self, stat: &StatisticValue) -> bool {
        match StatName::from_name(&stat.name) {
            Some(StatName::Money) => {
                self.money = f64::from(stat.value);
                true
            }
            Some(StatName::Shafts) => {
                self.shafts = stat.value;
                true
            }
            None => false,
        }
    }
}

/// Fixed set of statistics known to the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatName {
    Money,
    Shafts,
}

impl StatName {
    pub const ALL: [StatName; 2] = [StatName::Money, StatName::Shafts];

    pub fn as_str(self) -> &'static str {
        match self {
            StatName::Money => "Money",
            StatName::Shafts => "Shafts",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == name)
    }
}

impl fmt::Display for StatName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single named statistic as exchanged with the stats service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticValue {
    pub name: String,
    pub value: i32,
}

impl StatisticValue {
    pub fn new(name: StatName, value: i32) -> Self {
        Self {
            name: name.as_str().to_string(),
            value,
        }
    }
}

/// Session state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    LoggedOut,
    Authenticating,
    LoggedIn,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::LoggedOut => write!(f, "logged out"),
            SessionState::Authenticating => write!(f, "authenticating"),
            SessionState::LoggedIn => write!(f, "logged in"),
        }
    }
}

/// How the current session was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginMethod {
    EmailPassword,
    Registration,
    Device,
}

/// Authenticated context returned by the identity service
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub player_id: String,
    pub session_ticket: String,
    pub newly_created: bool,
    pub method: LoginMethod,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("player_id", &self.player_id)
            .field("session_ticket", &"<redacted>")
            .field("newly_created", &self.newly_created)
            .field("method", &self.method)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DevicePlatform {
    Android,
    Ios,
    Desktop,
}

impl fmt::Display for DevicePlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DevicePlatform::Android => write!(f, "android"),
            DevicePlatform::Ios => write!(f, "ios"),
            DevicePlatform::Desktop => write!(f, "desktop"),
        }
    }
}

/// Stable per-device identifier used for anonymous login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceId {
    pub platform: DevicePlatform,
    pub id: String,
}

impl DeviceId {
    pub fn new(platform: DevicePlatform, id: impl Into<String>) -> Self {
        Self {
            platform,
            id: id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScriptLog {
    pub level: String,
    pub message: String,
}

/// Error raised inside the cloud script itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptFailure {
    pub error: String,
    pub message: String,
}

/// Raw outcome of a cloud script execution
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptExecution {
    pub function_name: String,
    pub result: Option<Value>,
    pub logs: Vec<ScriptLog>,
    pub error: Option<ScriptFailure>,
}

/// Result of a login operation driven by the session manager
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub session: Session,
    /// Stats fetched right after login; `None` when the fetch failed.
    pub stats: Option<PlayerStats>,
}
