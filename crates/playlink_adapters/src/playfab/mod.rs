//! PlayFab Client API adapter.
//!
//! One [`PlayFabClient`] implements the identity, statistics and cloud
//! script ports. Every call is a JSON `POST /Client/<Operation>`; calls made
//! on behalf of a player carry the session ticket in `X-Authorization`.

mod cloud_script;
mod identity;
pub mod models;
mod statistics;

use std::time::Duration;

use playlink_core::config::Settings;
use playlink_core::Error;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::network::build_api_client;
use models::ApiEnvelope;

pub use identity::parse_auth_error;

const AUTHORIZATION_HEADER: &str = "X-Authorization";

pub struct PlayFabClient {
    client: Client,
    base_url: String,
    title_id: String,
    timeout: Duration,
}

impl PlayFabClient {
    pub fn new(settings: &Settings) -> Result<Self, Error> {
        let timeout = settings.request_timeout();
        Ok(Self {
            client: build_api_client(timeout)?,
            base_url: settings.api_url(),
            title_id: settings.title_id.clone(),
            timeout,
        })
    }

    pub fn title_id(&self) -> &str {
        &self.title_id
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST `body` to `/Client/{operation}` and unwrap the `data` payload.
    #[instrument(skip(self, body, session_ticket))]
    async fn call<Req, Resp>(
        &self,
        operation: &str,
        body: &Req,
        session_ticket: Option<&str>,
    ) -> Result<Resp, Error>
    where
        Req: Serialize + ?Sized + Sync,
        Resp: DeserializeOwned,
    {
        let url = format!("{}/Client/{}", self.base_url, operation);
        debug!(url = %url, "calling PlayFab");

        let mut request = self.client.post(&url).json(body);
        if let Some(ticket) = session_ticket {
            request = request.header(AUTHORIZATION_HEADER, ticket);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout(self.timeout)
            } else {
                Error::Network(format!("{} request failed: {}", operation, e))
            }
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Network(format!("failed to read {} response: {}", operation, e)))?;

        let envelope: ApiEnvelope<Resp> = serde_json::from_str(&text).map_err(|e| {
            if status.is_success() {
                Error::InvalidServerResponse(format!("{}: {}", operation, e))
            } else {
                Error::Network(format!("{} returned HTTP {}", operation, status))
            }
        })?;

        if let Some(code) = envelope.error {
            let message = envelope.error_message.unwrap_or_default();
            warn!(
                operation,
                http = envelope.code,
                status = %envelope.status,
                error = %code,
                error_code = ?envelope.error_code,
                detail = %message,
                "PlayFab returned an error"
            );
            return Err(Error::Api { code, message });
        }

        envelope.data.ok_or_else(|| {
            Error::InvalidServerResponse(format!("{} response has no data", operation))
        })
    }
}
