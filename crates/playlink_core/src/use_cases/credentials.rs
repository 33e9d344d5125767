use std::sync::Arc;

use tracing::{debug, instrument};

use crate::entities::Credential;
use crate::error::Error;
use crate::ports::PreferenceStore;

pub const EMAIL_KEY: &str = "EMAIL";
pub const PASSWORD_KEY: &str = "PASSWORD";

/// Saved login credential, kept in plaintext in the preference store.
pub struct CredentialStore<P: PreferenceStore> {
    prefs: Arc<P>,
}

impl<P: PreferenceStore> Clone for CredentialStore<P> {
    fn clone(&self) -> Self {
        Self {
            prefs: Arc::clone(&self.prefs),
        }
    }
}

impl<P: PreferenceStore> CredentialStore<P> {
    pub fn new(prefs: Arc<P>) -> Self {
        Self { prefs }
    }

    /// Stored credential, if an email was ever saved
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<Option<Credential>, Error> {
        let Some(email) = self.prefs.get_string(EMAIL_KEY).await? else {
            return Ok(None);
        };
        let password = self
            .prefs
            .get_string(PASSWORD_KEY)
            .await?
            .unwrap_or_default();
        Ok(Some(Credential::new(email, password)))
    }

    #[instrument(skip(self, credential), fields(email = %credential.email))]
    pub async fn save(&self, credential: &Credential) -> Result<(), Error> {
        debug!("saving credential");
        self.prefs
            .set_many(&[
                (EMAIL_KEY, credential.email.clone()),
                (PASSWORD_KEY, credential.password.clone()),
            ])
            .await
    }

    /// Remove the credential keys only
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<(), Error> {
        self.prefs.delete_keys(&[EMAIL_KEY, PASSWORD_KEY]).await
    }
}
