use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, instrument, warn};

use crate::config::RegistrationFallback;
use crate::entities::{Credential, DeviceId, Session};
use crate::error::{AuthError, Error};
use crate::ports::{IdentityService, PreferenceStore};
use crate::session::SessionContext;
use crate::use_cases::{with_timeout, CredentialStore};

/// Drives the login flow against the identity service:
/// - email/password login with registration fallback
/// - anonymous device login
/// - linking an email login to the current account
pub struct AuthClient<I, P>
where
    I: IdentityService,
    P: PreferenceStore,
{
    identity: Arc<I>,
    credentials: CredentialStore<P>,
    context: Arc<SessionContext>,
    fallback: RegistrationFallback,
    timeout: Duration,
}

impl<I, P> AuthClient<I, P>
where
    I: IdentityService,
    P: PreferenceStore,
{
    pub fn new(
        identity: Arc<I>,
        credentials: CredentialStore<P>,
        context: Arc<SessionContext>,
        fallback: RegistrationFallback,
        timeout: Duration,
    ) -> Self {
        Self {
            identity,
            credentials,
            context,
            fallback,
            timeout,
        }
    }

    /// Log in with an email credential, registering it when login fails.
    ///
    /// With the default `Always` policy the registration is attempted after
    /// any failure, network errors included, so a transient outage can look
    /// like a first run. The credential is saved on success.
    #[instrument(skip(self, credential), fields(email = %credential.email))]
    pub async fn login_with_stored(&self, credential: &Credential) -> Result<Session, AuthError> {
        let attempt = self.context.begin_auth().await;

        match self.login_or_register(credential).await {
            Ok(session) => {
                info!(player_id = %session.player_id, method = ?session.method, "login successful");
                if let Err(e) = self.credentials.save(credential).await {
                    warn!(error = %e, "failed to persist credential");
                }
                attempt.succeed(session.clone());
                Ok(session)
            }
            Err(e) => {
                attempt.fail();
                Err(e)
            }
        }
    }

    /// Log in with the device identifier, creating the account on first use.
    #[instrument(skip(self), fields(platform = %device.platform))]
    pub async fn login_anonymous(&self, device: &DeviceId) -> Result<Session, AuthError> {
        let attempt = self.context.begin_auth().await;

        match with_timeout(self.timeout, self.identity.login_with_device(device)).await {
            Ok(session) => {
                info!(player_id = %session.player_id, newly_created = session.newly_created, "device login successful");
                attempt.succeed(session.clone());
                Ok(session)
            }
            Err(e) => {
                let e = e.into_auth();
                error!(error = %e, "device login failed");
                attempt.fail();
                Err(e)
            }
        }
    }

    /// Attach an email login to the current account and save it locally.
    #[instrument(skip(self, credential), fields(email = %credential.email))]
    pub async fn add_login(&self, credential: &Credential) -> Result<(), Error> {
        let session = self.context.require_session()?;

        with_timeout(
            self.timeout,
            self.identity.add_username_password(&session, credential),
        )
        .await
        .map_err(|e| {
            error!(error = %e, "adding email login failed");
            Error::Auth(e.into_auth())
        })?;

        info!("email login added");
        self.credentials.save(credential).await
    }

    async fn login_or_register(&self, credential: &Credential) -> Result<Session, AuthError> {
        let login_error =
            match with_timeout(self.timeout, self.identity.login_with_email(credential)).await {
                Ok(session) => return Ok(session),
                Err(e) => e.into_auth(),
            };

        warn!(error = %login_error, "email login failed");

        if !self.should_register(&login_error) {
            return Err(login_error);
        }

        info!("attempting registration with the same credential");
        with_timeout(self.timeout, self.identity.register(credential))
            .await
            .map_err(|e| {
                let e = e.into_auth();
                error!(error = %e, "registration failed");
                e
            })
    }

    fn should_register(&self, login_error: &AuthError) -> bool {
        match self.fallback {
            RegistrationFallback::Always => true,
            RegistrationFallback::AccountNotFound => {
                matches!(login_error, AuthError::AccountNotFound)
            }
            RegistrationFallback::Never => false,
        }
    }
}
