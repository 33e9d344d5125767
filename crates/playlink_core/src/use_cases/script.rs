use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tracing::{debug, error, info, instrument, warn};

use crate::config::ScriptSettings;
use crate::entities::PlayerStats;
use crate::error::Error;
use crate::ports::ScriptService;
use crate::session::SessionContext;
use crate::use_cases::with_timeout;

/// Key the stats script uses for its human-readable reply
pub const MESSAGE_VALUE_KEY: &str = "messageValue";

/// Look up the script's `messageValue` string, if it sent one.
pub fn message_value(result: &Value) -> Option<&str> {
    result.get(MESSAGE_VALUE_KEY).and_then(Value::as_str)
}

/// Runs named cloud functions for the logged-in player
pub struct ScriptInvoker<X: ScriptService> {
    scripts: Arc<X>,
    context: Arc<SessionContext>,
    settings: ScriptSettings,
    timeout: Duration,
}

impl<X: ScriptService> ScriptInvoker<X> {
    pub fn new(
        scripts: Arc<X>,
        context: Arc<SessionContext>,
        settings: ScriptSettings,
        timeout: Duration,
    ) -> Self {
        Self {
            scripts,
            context,
            settings,
            timeout,
        }
    }

    /// Execute `function_name` and return its untyped result (`Null` if none).
    #[instrument(skip(self, params))]
    pub async fn invoke(&self, function_name: &str, params: Value) -> Result<Value, Error> {
        let session = self.context.require_session()?;

        let execution = with_timeout(
            self.timeout,
            self.scripts.execute(
                &session,
                function_name,
                &params,
                self.settings.generate_play_stream_event,
            ),
        )
        .await
        .map_err(|e| {
            error!(error = %e, "cloud script request failed");
            e
        })?;

        for log in &execution.logs {
            debug!(level = %log.level, line = %log.message, "cloud script log");
        }

        if let Some(failure) = execution.error {
            error!(error = %failure.error, detail = %failure.message, "cloud script raised an error");
            return Err(Error::Script {
                function: function_name.to_string(),
                message: format!("{}: {}", failure.error, failure.message),
            });
        }

        Ok(execution.result.unwrap_or(Value::Null))
    }

    /// Run the configured stats function with the given totals.
    ///
    /// Returns the script's `messageValue`, if any.
    pub async fn update_player_stats(&self, stats: &PlayerStats) -> Result<Option<String>, Error> {
        let params = json!({
            "Money": stats.money,
            "Shafts": stats.shafts,
        });
        let function_name = self.settings.function_name.clone();
        let result = self.invoke(&function_name, params).await?;

        match message_value(&result) {
            Some(message) => {
                info!(reply = message, "cloud stats update finished");
                Ok(Some(message.to_string()))
            }
            None => {
                warn!("cloud stats update returned no messageValue");
                Ok(None)
            }
        }
    }
}
