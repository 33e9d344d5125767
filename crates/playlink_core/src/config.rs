use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Title used when none is configured
pub const DEFAULT_TITLE_ID: &str = "F02D2";

/// When a failed email login falls back to registering the same credential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationFallback {
    /// Register after any login failure, including network errors
    #[default]
    Always,
    /// Register only when the service reports an unknown account
    AccountNotFound,
    Never,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    pub title_id: String,
    /// Overrides `https://{title_id}.playfabapi.com`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    pub request_timeout_secs: u64,
    pub registration_fallback: RegistrationFallback,
    pub log_level: String,
    pub script: ScriptSettings,
    pub storage: StorageSettings,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ScriptSettings {
    pub function_name: String,
    pub generate_play_stream_event: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageSettings {
    pub file_name: String,
}

impl Settings {
    pub fn api_url(&self) -> String {
        match &self.api_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://{}.playfabapi.com", self.title_id),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            title_id: DEFAULT_TITLE_ID.to_string(),
            api_url: None,
            request_timeout_secs: 30,
            registration_fallback: RegistrationFallback::default(),
            log_level: "info".to_string(),
            script: ScriptSettings::default(),
            storage: StorageSettings::default(),
        }
    }
}

impl Default for ScriptSettings {
    fn default() -> Self {
        Self {
            function_name: "UpdatePlayerStats".to_string(),
            generate_play_stream_event: true,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            file_name: "prefs.json".to_string(),
        }
    }
}
