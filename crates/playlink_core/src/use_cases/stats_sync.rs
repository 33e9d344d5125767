use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument};

use crate::entities::{PlayerStats, StatisticValue};
use crate::error::Error;
use crate::ports::{PreferenceStore, StatisticsService};
use crate::session::SessionContext;
use crate::use_cases::with_timeout;

pub const MONEY_KEY: &str = "MONEY";
pub const SHAFTS_KEY: &str = "SHAFTS";

/// Last synced stats, persisted next to the credential keys.
///
/// Reads and writes go through one lock, so a merge of remote values never
/// interleaves with a local update.
pub struct StatsCache<P: PreferenceStore> {
    prefs: Arc<P>,
    lock: Mutex<()>,
}

impl<P: PreferenceStore> StatsCache<P> {
    pub fn new(prefs: Arc<P>) -> Self {
        Self {
            prefs,
            lock: Mutex::new(()),
        }
    }

    pub async fn load(&self) -> Result<PlayerStats, Error> {
        let _lock = self.lock.lock().await;
        self.read().await
    }

    pub async fn store(&self, stats: &PlayerStats) -> Result<(), Error> {
        let _lock = self.lock.lock().await;
        self.write(stats).await
    }

    /// Apply `remote` over the cached stats and save the result.
    /// Untracked names are skipped.
    pub async fn merge(&self, remote: &[StatisticValue]) -> Result<PlayerStats, Error> {
        let _lock = self.lock.lock().await;
        let mut stats = self.read().await?;
        for stat in remote {
            if stats.apply(stat) {
                debug!(name = %stat.name, value = stat.value, "received statistic");
            } else {
                debug!(name = %stat.name, "ignoring untracked statistic");
            }
        }
        self.write(&stats).await?;
        Ok(stats)
    }

    async fn read(&self) -> Result<PlayerStats, Error> {
        let mut stats = PlayerStats::default();
        if let Some(money) = self.prefs.get_string(MONEY_KEY).await? {
            stats.money = money.parse().map_err(|_| {
                Error::PreferenceStorage(format!("invalid cached money value: {}", money))
            })?;
        }
        if let Some(shafts) = self.prefs.get_string(SHAFTS_KEY).await? {
            stats.shafts = shafts.parse().map_err(|_| {
                Error::PreferenceStorage(format!("invalid cached shafts value: {}", shafts))
            })?;
        }
        Ok(stats)
    }

    async fn write(&self, stats: &PlayerStats) -> Result<(), Error> {
        self.prefs
            .set_many(&[
                (MONEY_KEY, stats.money.to_string()),
                (SHAFTS_KEY, stats.shafts.to_string()),
            ])
            .await
    }
}

/// Pushes and pulls the tracked stats for the logged-in player
pub struct StatsSyncClient<S, P>
where
    S: StatisticsService,
    P: PreferenceStore,
{
    statistics: Arc<S>,
    cache: StatsCache<P>,
    context: Arc<SessionContext>,
    timeout: Duration,
}

impl<S, P> StatsSyncClient<S, P>
where
    S: StatisticsService,
    P: PreferenceStore,
{
    pub fn new(
        statistics: Arc<S>,
        cache: StatsCache<P>,
        context: Arc<SessionContext>,
        timeout: Duration,
    ) -> Self {
        Self {
            statistics,
            cache,
            context,
            timeout,
        }
    }

    /// Send every tracked stat in one batch. Money is truncated, not rounded.
    #[instrument(skip(self))]
    pub async fn push(&self, stats: PlayerStats) -> Result<(), Error> {
        let session = self.context.require_session()?;
        let updates = stats.to_updates();

        with_timeout(
            self.timeout,
            self.statistics.update_statistics(&session, &updates),
        )
        .await
        .map_err(|e| {
            error!(error = %e, "statistics update failed");
            e
        })?;

        info!(?updates, "player statistics updated");
        self.cache.store(&stats).await
    }

    /// Fetch remote stats over the local cache; unknown names are skipped.
    #[instrument(skip(self))]
    pub async fn pull(&self) -> Result<PlayerStats, Error> {
        let session = self.context.require_session()?;

        let remote = with_timeout(self.timeout, self.statistics.get_statistics(&session))
            .await
            .map_err(|e| {
                error!(error = %e, "statistics fetch failed");
                e
            })?;

        let stats = self.cache.merge(&remote).await?;
        info!(money = stats.money, shafts = stats.shafts, "player statistics received");
        Ok(stats)
    }

    pub async fn cached(&self) -> Result<PlayerStats, Error> {
        self.cache.load().await
    }

    /// Record a local change without syncing it
    pub async fn record(&self, stats: PlayerStats) -> Result<(), Error> {
        self.cache.store(&stats).await
    }
}
