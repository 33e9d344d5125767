//! Shared HTTP client configuration for the PlayFab API.

use std::time::Duration;

use playlink_core::Error;
use reqwest::Client;

/// Default connect timeout (10 seconds)
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// User agent sent with every API request
pub const USER_AGENT: &str = concat!("playlink/", env!("CARGO_PKG_VERSION"));

/// Build a configured HTTP client for PlayFab requests.
///
/// `timeout` bounds each whole request; the connect phase is capped
/// separately and never exceeds it.
pub fn build_api_client(timeout: Duration) -> Result<Client, Error> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .connect_timeout(DEFAULT_CONNECT_TIMEOUT.min(timeout))
        .build()
        .map_err(|e| Error::Network(format!("failed to create API HTTP client: {}", e)))
}
