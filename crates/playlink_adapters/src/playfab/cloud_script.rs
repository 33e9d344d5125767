use async_trait::async_trait;
use playlink_core::entities::{ScriptExecution, ScriptFailure, ScriptLog, Session};
use playlink_core::ports::ScriptService;
use playlink_core::Error;
use serde_json::Value;
use tracing::instrument;

use super::models::{ExecuteCloudScriptRequest, ExecuteCloudScriptResult};
use super::PlayFabClient;

impl From<ExecuteCloudScriptResult> for ScriptExecution {
    fn from(result: ExecuteCloudScriptResult) -> Self {
        Self {
            function_name: result.function_name,
            result: result.function_result,
            logs: result
                .logs
                .into_iter()
                .map(|l| ScriptLog {
                    level: l.level,
                    message: l.message,
                })
                .collect(),
            error: result.error.map(|e| ScriptFailure {
                error: e.error,
                message: e.message,
            }),
        }
    }
}

#[async_trait]
impl ScriptService for PlayFabClient {
    #[instrument(skip(self, session, params), fields(player_id = %session.player_id))]
    async fn execute(
        &self,
        session: &Session,
        function_name: &str,
        params: &Value,
        generate_play_stream_event: bool,
    ) -> Result<ScriptExecution, Error> {
        let request = ExecuteCloudScriptRequest {
            function_name,
            function_parameter: params,
            generate_play_stream_event,
        };

        let result: ExecuteCloudScriptResult = self
            .call("ExecuteCloudScript", &request, Some(&session.session_ticket))
            .await?;

        Ok(result.into())
    }
}
