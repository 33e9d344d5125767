use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::config::Settings;
use crate::entities::{Credential, DeviceId, LoginOutcome, PlayerStats, Session, SessionState};
use crate::error::Error;
use crate::ports::{DeviceInfo, IdentityService, PreferenceStore, ScriptService, StatisticsService};
use crate::session::SessionContext;
use crate::use_cases::{AuthClient, CredentialStore, ScriptInvoker, StatsCache, StatsSyncClient};

/// Entry point handed to UI collaborators.
///
/// Owns the session context and composes the auth, stats and script
/// clients. Every successful login is followed by a stats pull; the
/// login and its pull run as one unit, so overlapping logins cannot leave
/// an earlier player's stats in the cache.
pub struct SessionManager<I, S, X, P>
where
    I: IdentityService,
    S: StatisticsService,
    X: ScriptService,
    P: PreferenceStore,
{
    context: Arc<SessionContext>,
    login_lock: Mutex<()>,
    prefs: Arc<P>,
    credentials: CredentialStore<P>,
    auth: AuthClient<I, P>,
    stats: StatsSyncClient<S, P>,
    scripts: ScriptInvoker<X>,
}

impl<I, S, X, P> SessionManager<I, S, X, P>
where
    I: IdentityService,
    S: StatisticsService,
    X: ScriptService,
    P: PreferenceStore,
{
    pub fn new(
        identity: Arc<I>,
        statistics: Arc<S>,
        scripts: Arc<X>,
        prefs: Arc<P>,
        settings: &Settings,
    ) -> Self {
        let context = Arc::new(SessionContext::new());
        let timeout = settings.request_timeout();
        let credentials = CredentialStore::new(Arc::clone(&prefs));

        Self {
            auth: AuthClient::new(
                identity,
                credentials.clone(),
                Arc::clone(&context),
                settings.registration_fallback,
                timeout,
            ),
            stats: StatsSyncClient::new(
                statistics,
                StatsCache::new(Arc::clone(&prefs)),
                Arc::clone(&context),
                timeout,
            ),
            scripts: ScriptInvoker::new(
                scripts,
                Arc::clone(&context),
                settings.script.clone(),
                timeout,
            ),
            context,
            login_lock: Mutex::new(()),
            prefs,
            credentials,
        }
    }

    pub fn state(&self) -> SessionState {
        self.context.state()
    }

    pub fn session(&self) -> Option<Session> {
        self.context.session()
    }

    /// Log in with the saved credential, or anonymously by device when
    /// nothing is saved.
    #[instrument(skip(self, device))]
    pub async fn start(&self, device: &dyn DeviceInfo) -> Result<LoginOutcome, Error> {
        match self.credentials.load().await? {
            Some(credential) => {
                info!(email = %credential.email, "using saved credential");
                self.login_with_stored(&credential).await
            }
            None => {
                info!("no saved credential, logging in by device");
                let device_id = device.device_id()?;
                self.login_anonymous(&device_id).await
            }
        }
    }

    /// Email login with registration fallback; also used for credentials
    /// typed into the UI.
    pub async fn login_with_stored(&self, credential: &Credential) -> Result<LoginOutcome, Error> {
        let _login = self.login_lock.lock().await;
        let session = self.auth.login_with_stored(credential).await?;
        Ok(self.after_login(session).await)
    }

    pub async fn login_anonymous(&self, device: &DeviceId) -> Result<LoginOutcome, Error> {
        let _login = self.login_lock.lock().await;
        let session = self.auth.login_anonymous(device).await?;
        Ok(self.after_login(session).await)
    }

    pub async fn add_login(&self, credential: &Credential) -> Result<(), Error> {
        self.auth.add_login(credential).await
    }

    pub async fn push_stats(&self, stats: PlayerStats) -> Result<(), Error> {
        self.stats.push(stats).await
    }

    pub async fn pull_stats(&self) -> Result<PlayerStats, Error> {
        self.stats.pull().await
    }

    pub async fn cached_stats(&self) -> Result<PlayerStats, Error> {
        self.stats.cached().await
    }

    pub async fn record_stats(&self, stats: PlayerStats) -> Result<(), Error> {
        self.stats.record(stats).await
    }

    pub async fn invoke_script(&self, function_name: &str, params: Value) -> Result<Value, Error> {
        self.scripts.invoke(function_name, params).await
    }

    /// Run the configured stats script with the cached totals.
    pub async fn cloud_update_stats(&self) -> Result<Option<String>, Error> {
        let stats = self.stats.cached().await?;
        self.scripts.update_player_stats(&stats).await
    }

    pub async fn saved_credential(&self) -> Result<Option<Credential>, Error> {
        self.credentials.load().await
    }

    /// Forget the saved credential; other local state is kept.
    pub async fn clear_credentials(&self) -> Result<(), Error> {
        self.credentials.clear().await
    }

    /// Delete every local preference, including keys this client never wrote.
    #[instrument(skip(self))]
    pub async fn wipe_local_state(&self) -> Result<(), Error> {
        warn!("wiping all local preferences");
        self.prefs.delete_all().await
    }

    pub async fn logout(&self) {
        self.context.end().await;
        info!("logged out");
    }

    async fn after_login(&self, session: Session) -> LoginOutcome {
        let stats = match self.stats.pull().await {
            Ok(stats) => Some(stats),
            Err(e) => {
                warn!(error = %e, "post-login statistics fetch failed");
                None
            }
        };
        LoginOutcome { session, stats }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegistrationFallback;
    use crate::entities::{DevicePlatform, LoginMethod};
    use crate::error::AuthError;
    use crate::use_cases::fakes::{
        FakeIdentity, FakeScripts, FakeStatistics, FixedDevice, MemoryPreferenceStore,
    };
    use crate::use_cases::{EMAIL_KEY, MONEY_KEY};
    use serde_json::json;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    type Manager =
        SessionManager<FakeIdentity, FakeStatistics, FakeScripts, MemoryPreferenceStore>;

    struct Harness {
        manager: Arc<Manager>,
        identity: Arc<FakeIdentity>,
        statistics: Arc<FakeStatistics>,
        scripts: Arc<FakeScripts>,
        prefs: Arc<MemoryPreferenceStore>,
    }

    fn harness(identity: FakeIdentity, statistics: FakeStatistics) -> Harness {
        let identity = Arc::new(identity);
        let statistics = Arc::new(statistics);
        let scripts = Arc::new(FakeScripts::returning(Some(
            json!({"messageValue": "Updated"}),
        )));
        let prefs = Arc::new(MemoryPreferenceStore::default());
        let settings = Settings {
            registration_fallback: RegistrationFallback::Always,
            ..Settings::default()
        };
        let manager = Arc::new(SessionManager::new(
            Arc::clone(&identity),
            Arc::clone(&statistics),
            Arc::clone(&scripts),
            Arc::clone(&prefs),
            &settings,
        ));
        Harness {
            manager,
            identity,
            statistics,
            scripts,
            prefs,
        }
    }

    fn cred(email: &str) -> Credential {
        Credential::new(email.to_string(), "secret".to_string())
    }

    fn device() -> FixedDevice {
        FixedDevice(DeviceId::new(DevicePlatform::Desktop, "host-1"))
    }

    #[tokio::test]
    async fn test_start_without_credential_uses_device() {
        let h = harness(FakeIdentity::default(), FakeStatistics::default());

        let outcome = h.manager.start(&device()).await.unwrap();

        assert_eq!(outcome.session.method, LoginMethod::Device);
        assert_eq!(outcome.session.player_id, "device-host-1");
        assert_eq!(h.manager.state(), SessionState::LoggedIn);
        assert_eq!(h.identity.login_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_start_with_saved_credential_pulls_stats() {
        let h = harness(
            FakeIdentity::default(),
            FakeStatistics::with_remote(&[("Money", 120), ("Shafts", 6), ("Gems", 3)]),
        );
        h.prefs.set_string(EMAIL_KEY, "miner@example.com").await.unwrap();

        let outcome = h.manager.start(&device()).await.unwrap();

        assert_eq!(outcome.session.player_id, "player-miner@example.com");
        assert_eq!(outcome.stats, Some(PlayerStats::new(120.0, 6)));
        assert_eq!(
            h.manager.cached_stats().await.unwrap(),
            PlayerStats::new(120.0, 6)
        );
    }

    #[tokio::test]
    async fn test_login_then_pull_matches_last_push() {
        let h = harness(FakeIdentity::default(), FakeStatistics::default());
        h.manager.login_with_stored(&cred("a@x.io")).await.unwrap();
        h.manager.push_stats(PlayerStats::new(77.9, 5)).await.unwrap();
        h.manager.logout().await;

        let outcome = h.manager.login_with_stored(&cred("a@x.io")).await.unwrap();

        assert_eq!(outcome.stats, Some(PlayerStats::new(77.0, 5)));
    }

    #[tokio::test]
    async fn test_failed_stats_fetch_does_not_fail_login() {
        let statistics = FakeStatistics::default();
        *statistics.fail.lock().unwrap() = true;
        let h = harness(FakeIdentity::default(), statistics);

        let outcome = h.manager.login_with_stored(&cred("a@x.io")).await.unwrap();

        assert!(outcome.stats.is_none());
        assert_eq!(h.manager.state(), SessionState::LoggedIn);
    }

    #[tokio::test]
    async fn test_network_failure_registers_exactly_once() {
        let h = harness(
            FakeIdentity::failing_login(Error::Network("unreachable".to_string())),
            FakeStatistics::default(),
        );

        let outcome = h.manager.login_with_stored(&cred("new@x.io")).await.unwrap();

        assert_eq!(outcome.session.method, LoginMethod::Registration);
        assert_eq!(h.identity.register_count(), 1);
        assert_eq!(h.identity.registrations.lock().unwrap()[0].email, "new@x.io");
    }

    #[tokio::test]
    async fn test_registration_failure_is_typed() {
        let h = harness(
            FakeIdentity::failing_login(Error::Auth(AuthError::InvalidCredential))
                .with_register_error(Error::Auth(AuthError::AlreadyRegistered)),
            FakeStatistics::default(),
        );

        let err = h.manager.login_with_stored(&cred("a@x.io")).await.unwrap_err();

        assert!(matches!(err, Error::Auth(AuthError::AlreadyRegistered)));
        assert_eq!(h.manager.state(), SessionState::LoggedOut);
        assert!(h.manager.session().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_logins_are_serialized() {
        let h = harness(
            FakeIdentity::default().with_delay(Duration::from_millis(20)),
            FakeStatistics::default(),
        );

        let first = {
            let manager = Arc::clone(&h.manager);
            tokio::spawn(async move { manager.login_with_stored(&cred("one@x.io")).await })
        };
        let second = {
            let manager = Arc::clone(&h.manager);
            tokio::spawn(async move { manager.login_with_stored(&cred("two@x.io")).await })
        };
        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();

        assert_eq!(h.identity.max_in_flight.load(Ordering::SeqCst), 1);
        let completed = h.identity.completed.lock().unwrap().clone();
        assert_eq!(completed.len(), 2);
        assert_eq!(h.manager.state(), SessionState::LoggedIn);
        assert_eq!(
            h.manager.session().unwrap().player_id,
            completed[1],
            "last completed login owns the session"
        );
        let saved = h.manager.saved_credential().await.unwrap().unwrap();
        assert_eq!(format!("player-{}", saved.email), completed[1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_pull_from_earlier_login_does_not_overwrite_cache() {
        let statistics = FakeStatistics::default()
            .with_player("player-one@x.io", 111, Duration::from_millis(150))
            .with_player("player-two@x.io", 222, Duration::ZERO);
        let h = harness(FakeIdentity::default(), statistics);

        let first = {
            let manager = Arc::clone(&h.manager);
            tokio::spawn(async move { manager.login_with_stored(&cred("one@x.io")).await })
        };
        tokio::task::yield_now().await;
        let second = {
            let manager = Arc::clone(&h.manager);
            tokio::spawn(async move { manager.login_with_stored(&cred("two@x.io")).await })
        };
        let first = first.await.unwrap().unwrap();
        let second = second.await.unwrap().unwrap();

        assert_eq!(first.stats.map(|s| s.money), Some(111.0));
        assert_eq!(second.stats.map(|s| s.money), Some(222.0));
        assert_eq!(h.manager.session().unwrap().player_id, "player-two@x.io");
        assert_eq!(
            h.manager.saved_credential().await.unwrap().unwrap().email,
            "two@x.io"
        );
        assert_eq!(h.manager.cached_stats().await.unwrap().money, 222.0);
    }

    #[tokio::test]
    async fn test_clear_credentials_keeps_stats_cache() {
        let h = harness(FakeIdentity::default(), FakeStatistics::default());
        h.manager.login_with_stored(&cred("a@x.io")).await.unwrap();
        h.manager.record_stats(PlayerStats::new(3.0, 1)).await.unwrap();

        h.manager.clear_credentials().await.unwrap();

        assert!(h.manager.saved_credential().await.unwrap().is_none());
        assert!(h.prefs.has_key(MONEY_KEY).await.unwrap());
        assert_eq!(
            h.manager.cached_stats().await.unwrap(),
            PlayerStats::new(3.0, 1)
        );
    }

    #[tokio::test]
    async fn test_wipe_removes_everything() {
        let h = harness(FakeIdentity::default(), FakeStatistics::default());
        h.manager.login_with_stored(&cred("a@x.io")).await.unwrap();
        h.manager.record_stats(PlayerStats::new(3.0, 1)).await.unwrap();
        h.prefs.set_string("GRAPHICS_QUALITY", "high").await.unwrap();

        h.manager.wipe_local_state().await.unwrap();

        assert!(h.prefs.keys().await.is_empty());
        assert!(h.manager.saved_credential().await.unwrap().is_none());
        assert_eq!(h.manager.cached_stats().await.unwrap(), PlayerStats::default());
    }

    #[tokio::test]
    async fn test_cloud_update_uses_cached_stats() {
        let h = harness(FakeIdentity::default(), FakeStatistics::default());
        h.manager.start(&device()).await.unwrap();
        h.manager.record_stats(PlayerStats::new(8.5, 2)).await.unwrap();

        let message = h.manager.cloud_update_stats().await.unwrap();

        assert_eq!(message.as_deref(), Some("Updated"));
        let calls = h.scripts.calls.lock().unwrap().clone();
        assert_eq!(calls[0].1, json!({"Money": 8.5, "Shafts": 2}));
    }

    #[tokio::test]
    async fn test_logout_blocks_stats() {
        let h = harness(FakeIdentity::default(), FakeStatistics::default());
        h.manager.start(&device()).await.unwrap();
        h.manager.logout().await;

        assert!(matches!(
            h.manager.push_stats(PlayerStats::new(1.0, 1)).await,
            Err(Error::NotLoggedIn)
        ));
        assert!(h.statistics.batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_login_after_device_login() {
        let h = harness(FakeIdentity::default(), FakeStatistics::default());
        h.manager.start(&device()).await.unwrap();

        h.manager
            .add_login(&cred("linked@x.io").with_display_name("linker".to_string()))
            .await
            .unwrap();

        assert_eq!(
            h.manager.saved_credential().await.unwrap().unwrap().email,
            "linked@x.io"
        );
    }
}
