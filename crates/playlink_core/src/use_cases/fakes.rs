//! In-memory port implementations for use case tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::entities::{
    Credential, DeviceId, LoginMethod, ScriptExecution, Session, StatName, StatisticValue,
};
use crate::error::{AuthError, Error};
use crate::ports::{DeviceInfo, IdentityService, PreferenceStore, ScriptService, StatisticsService};

#[derive(Default)]
pub struct MemoryPreferenceStore {
    values: Mutex<BTreeMap<String, String>>,
    /// Applied to every read
    pub read_delay: StdMutex<Duration>,
}

impl MemoryPreferenceStore {
    pub async fn keys(&self) -> Vec<String> {
        self.values.lock().await.keys().cloned().collect()
    }
}

#[async_trait]
impl PreferenceStore for MemoryPreferenceStore {
    async fn get_string(&self, key: &str) -> Result<Option<String>, Error> {
        let delay = *self.read_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn set_string(&self, key: &str, value: &str) -> Result<(), Error> {
        self.values
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn set_many(&self, entries: &[(&str, String)]) -> Result<(), Error> {
        let mut values = self.values.lock().await;
        for (key, value) in entries {
            values.insert(key.to_string(), value.clone());
        }
        Ok(())
    }

    async fn delete_keys(&self, keys: &[&str]) -> Result<(), Error> {
        let mut values = self.values.lock().await;
        for key in keys {
            values.remove(*key);
        }
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), Error> {
        self.values.lock().await.clear();
        Ok(())
    }
}

pub fn session_for(player_id: &str, method: LoginMethod) -> Session {
    Session {
        player_id: player_id.to_string(),
        session_ticket: format!("ticket-{}", player_id),
        newly_created: method == LoginMethod::Registration,
        method,
    }
}

/// Identity service with switchable failures and call accounting
#[derive(Default)]
pub struct FakeIdentity {
    pub login_error: StdMutex<Option<Error>>,
    pub register_error: StdMutex<Option<Error>>,
    pub delay: StdMutex<Duration>,
    pub login_calls: AtomicUsize,
    pub registrations: StdMutex<Vec<Credential>>,
    pub linked: StdMutex<Vec<(String, Credential)>>,
    pub completed: StdMutex<Vec<String>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl FakeIdentity {
    pub fn failing_login(error: Error) -> Self {
        let fake = Self::default();
        *fake.login_error.lock().unwrap() = Some(error);
        fake
    }

    pub fn with_register_error(self, error: Error) -> Self {
        *self.register_error.lock().unwrap() = Some(error);
        self
    }

    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.lock().unwrap() = delay;
        self
    }

    pub fn register_count(&self) -> usize {
        self.registrations.lock().unwrap().len()
    }

    async fn enter(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    fn leave(&self, player_id: &str) {
        self.completed.lock().unwrap().push(player_id.to_string());
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

fn take_error(slot: &StdMutex<Option<Error>>) -> Option<Error> {
    slot.lock().unwrap().as_ref().map(|e| match e {
        Error::Auth(auth) => Error::Auth(auth.clone()),
        Error::Network(msg) => Error::Network(msg.clone()),
        other => Error::Other(other.to_string()),
    })
}

#[async_trait]
impl IdentityService for FakeIdentity {
    async fn login_with_email(&self, credential: &Credential) -> Result<Session, Error> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        self.enter().await;
        let player_id = format!("player-{}", credential.email);
        self.leave(&player_id);
        match take_error(&self.login_error) {
            Some(e) => Err(e),
            None => Ok(session_for(&player_id, LoginMethod::EmailPassword)),
        }
    }

    async fn login_with_device(&self, device: &DeviceId) -> Result<Session, Error> {
        self.enter().await;
        let player_id = format!("device-{}", device.id);
        self.leave(&player_id);
        Ok(session_for(&player_id, LoginMethod::Device))
    }

    async fn register(&self, credential: &Credential) -> Result<Session, Error> {
        self.registrations.lock().unwrap().push(credential.clone());
        match take_error(&self.register_error) {
            Some(e) => Err(e),
            None => Ok(session_for(
                &format!("player-{}", credential.email),
                LoginMethod::Registration,
            )),
        }
    }

    async fn add_username_password(
        &self,
        session: &Session,
        credential: &Credential,
    ) -> Result<(), Error> {
        if credential.email.is_empty() {
            return Err(Error::Auth(AuthError::InvalidCredential));
        }
        self.linked
            .lock()
            .unwrap()
            .push((session.player_id.clone(), credential.clone()));
        Ok(())
    }
}

/// Remote stats store keeping the last value per name
#[derive(Default)]
pub struct FakeStatistics {
    pub stored: StdMutex<BTreeMap<String, i32>>,
    pub batches: StdMutex<Vec<Vec<StatisticValue>>>,
    pub fail: StdMutex<bool>,
    pub delay: StdMutex<Duration>,
    /// Per-player fetch answers: Money value and how long the fetch takes
    pub per_player: StdMutex<BTreeMap<String, (i32, Duration)>>,
}

impl FakeStatistics {
    pub fn with_remote(values: &[(&str, i32)]) -> Self {
        let fake = Self::default();
        {
            let mut stored = fake.stored.lock().unwrap();
            for (name, value) in values {
                stored.insert(name.to_string(), *value);
            }
        }
        fake
    }

    pub fn with_player(self, player_id: &str, money: i32, delay: Duration) -> Self {
        self.per_player
            .lock()
            .unwrap()
            .insert(player_id.to_string(), (money, delay));
        self
    }
}

#[async_trait]
impl StatisticsService for FakeStatistics {
    async fn update_statistics(
        &self,
        _session: &Session,
        updates: &[StatisticValue],
    ) -> Result<(), Error> {
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if *self.fail.lock().unwrap() {
            return Err(Error::Network("stats backend unreachable".to_string()));
        }
        self.batches.lock().unwrap().push(updates.to_vec());
        let mut stored = self.stored.lock().unwrap();
        for update in updates {
            stored.insert(update.name.clone(), update.value);
        }
        Ok(())
    }

    async fn get_statistics(&self, session: &Session) -> Result<Vec<StatisticValue>, Error> {
        if *self.fail.lock().unwrap() {
            return Err(Error::Network("stats backend unreachable".to_string()));
        }
        let answer = self.per_player.lock().unwrap().get(&session.player_id).copied();
        if let Some((money, delay)) = answer {
            tokio::time::sleep(delay).await;
            return Ok(vec![StatisticValue::new(StatName::Money, money)]);
        }
        Ok(self
            .stored
            .lock()
            .unwrap()
            .iter()
            .map(|(name, value)| StatisticValue {
                name: name.clone(),
                value: *value,
            })
            .collect())
    }
}

/// Cloud script runner returning a canned execution
pub struct FakeScripts {
    pub response: StdMutex<ScriptExecution>,
    pub calls: StdMutex<Vec<(String, Value, bool)>>,
}

impl FakeScripts {
    pub fn returning(result: Option<Value>) -> Self {
        Self {
            response: StdMutex::new(ScriptExecution {
                function_name: String::new(),
                result,
                logs: Vec::new(),
                error: None,
            }),
            calls: StdMutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ScriptService for FakeScripts {
    async fn execute(
        &self,
        _session: &Session,
        function_name: &str,
        params: &Value,
        generate_play_stream_event: bool,
    ) -> Result<ScriptExecution, Error> {
        self.calls.lock().unwrap().push((
            function_name.to_string(),
            params.clone(),
            generate_play_stream_event,
        ));
        let mut response = self.response.lock().unwrap().clone();
        response.function_name = function_name.to_string();
        Ok(response)
    }
}

pub struct FixedDevice(pub DeviceId);

impl DeviceInfo for FixedDevice {
    fn device_id(&self) -> Result<DeviceId, Error> {
        Ok(self.0.clone())
    }
}
