use async_trait::async_trait;
use playlink_core::entities::{Session, StatisticValue};
use playlink_core::ports::StatisticsService;
use playlink_core::Error;
use serde_json::Value;
use tracing::{debug, instrument};

use super::models::{
    GetPlayerStatisticsRequest, GetPlayerStatisticsResult, StatisticUpdate,
    UpdatePlayerStatisticsRequest,
};
use super::PlayFabClient;

#[async_trait]
impl StatisticsService for PlayFabClient {
    #[instrument(skip(self, session, updates), fields(player_id = %session.player_id))]
    async fn update_statistics(
        &self,
        session: &Session,
        updates: &[StatisticValue],
    ) -> Result<(), Error> {
        let request = UpdatePlayerStatisticsRequest {
            statistics: updates
                .iter()
                .map(|u| StatisticUpdate {
                    statistic_name: u.name.clone(),
                    value: u.value,
                })
                .collect(),
        };

        // Result payload is an empty object
        let _: Value = self
            .call(
                "UpdatePlayerStatistics",
                &request,
                Some(&session.session_ticket),
            )
            .await?;

        debug!(count = updates.len(), "statistics updated");
        Ok(())
    }

    #[instrument(skip(self, session), fields(player_id = %session.player_id))]
    async fn get_statistics(&self, session: &Session) -> Result<Vec<StatisticValue>, Error> {
        let result: GetPlayerStatisticsResult = self
            .call(
                "GetPlayerStatistics",
                &GetPlayerStatisticsRequest::default(),
                Some(&session.session_ticket),
            )
            .await?;

        debug!(count = result.statistics.len(), "statistics fetched");

        Ok(result
            .statistics
            .into_iter()
            .map(|s| StatisticValue {
                name: s.statistic_name,
                value: s.value,
            })
            .collect())
    }
}
