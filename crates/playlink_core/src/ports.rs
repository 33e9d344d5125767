use async_trait::async_trait;
use serde_json::Value;

use crate::entities::{Credential, DeviceId, ScriptExecution, Session, StatisticValue};
use crate::error::Error;

// ============================================================================
// Local Storage Ports
// ============================================================================

/// Local string key-value store (plaintext)
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn get_string(&self, key: &str) -> Result<Option<String>, Error>;

    async fn set_string(&self, key: &str, value: &str) -> Result<(), Error>;

    /// Write several keys in one update
    async fn set_many(&self, entries: &[(&str, String)]) -> Result<(), Error>;

    async fn has_key(&self, key: &str) -> Result<bool, Error> {
        Ok(self.get_string(key).await?.is_some())
    }

    /// Delete only the given keys
    async fn delete_keys(&self, keys: &[&str]) -> Result<(), Error>;

    /// Delete every stored key, not just the ones this client writes
    async fn delete_all(&self) -> Result<(), Error>;
}

// ============================================================================
// Remote Service Ports
// ============================================================================

/// Remote identity service
#[async_trait]
pub trait IdentityService: Send + Sync {
    async fn login_with_email(&self, credential: &Credential) -> Result<Session, Error>;

    /// Device login; creates the account if it does not exist yet
    async fn login_with_device(&self, device: &DeviceId) -> Result<Session, Error>;

    async fn register(&self, credential: &Credential) -> Result<Session, Error>;

    /// Attach email/password login to the account behind `session`
    async fn add_username_password(
        &self,
        session: &Session,
        credential: &Credential,
    ) -> Result<(), Error>;
}

/// Remote per-player statistics store
#[async_trait]
pub trait StatisticsService: Send + Sync {
    async fn update_statistics(
        &self,
        session: &Session,
        updates: &[StatisticValue],
    ) -> Result<(), Error>;

    async fn get_statistics(&self, session: &Session) -> Result<Vec<StatisticValue>, Error>;
}

/// Remote cloud script execution
#[async_trait]
pub trait ScriptService: Send + Sync {
    async fn execute(
        &self,
        session: &Session,
        function_name: &str,
        params: &Value,
        generate_play_stream_event: bool,
    ) -> Result<ScriptExecution, Error>;
}

/// Source of the stable device identifier
pub trait DeviceInfo: Send + Sync {
    fn device_id(&self) -> Result<DeviceId, Error>;
}
