use std::future::Future;
use std::time::Duration;

use crate::error::Error;

mod auth;
mod credentials;
mod script;
mod session_manager;
mod stats_sync;

#[cfg(test)]
pub(crate) mod fakes;

pub use auth::AuthClient;
pub use credentials::{CredentialStore, EMAIL_KEY, PASSWORD_KEY};
pub use script::{message_value, ScriptInvoker, MESSAGE_VALUE_KEY};
pub use session_manager::SessionManager;
pub use stats_sync::{StatsCache, StatsSyncClient, MONEY_KEY, SHAFTS_KEY};

/// Bound a remote call by `limit`.
pub(crate) async fn with_timeout<T, F>(limit: Duration, call: F) -> Result<T, Error>
where
    F: Future<Output = Result<T, Error>>,
{
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| Error::Timeout(limit))?
}
