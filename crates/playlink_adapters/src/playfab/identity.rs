use async_trait::async_trait;
use playlink_core::entities::{Credential, DeviceId, DevicePlatform, LoginMethod, Session};
use playlink_core::error::AuthError;
use playlink_core::ports::IdentityService;
use playlink_core::Error;
use tracing::{info, instrument};

use super::models::{
    AddUsernamePasswordRequest, AddUsernamePasswordResult, LoginResult,
    LoginWithAndroidDeviceIdRequest, LoginWithCustomIdRequest, LoginWithEmailAddressRequest,
    LoginWithIosDeviceIdRequest, RegisterPlayFabUserRequest, RegisterPlayFabUserResult,
};
use super::PlayFabClient;

/// Map a PlayFab error name onto the auth taxonomy
pub fn parse_auth_error(code: &str, message: &str) -> AuthError {
    match code {
        "AccountNotFound" => AuthError::AccountNotFound,
        "InvalidEmailOrPassword"
        | "InvalidUsernameOrPassword"
        | "InvalidPassword"
        | "InvalidEmailAddress"
        | "InvalidUsername"
        | "InvalidParams" => AuthError::InvalidCredential,
        "EmailAddressNotAvailable" | "UsernameNotAvailable" | "AccountAlreadyLinked" => {
            AuthError::AlreadyRegistered
        }
        _ if message.is_empty() => AuthError::Unknown(code.to_string()),
        _ => AuthError::Unknown(message.to_string()),
    }
}

fn auth_failure(e: Error) -> Error {
    match e {
        Error::Api { code, message } => Error::Auth(parse_auth_error(&code, &message)),
        other => other,
    }
}

fn into_session(result: LoginResult, method: LoginMethod) -> Session {
    Session {
        player_id: result.playfab_id,
        session_ticket: result.session_ticket,
        newly_created: result.newly_created,
        method,
    }
}

#[async_trait]
impl IdentityService for PlayFabClient {
    #[instrument(skip(self, credential), fields(email = %credential.email))]
    async fn login_with_email(&self, credential: &Credential) -> Result<Session, Error> {
        let request = LoginWithEmailAddressRequest {
            title_id: &self.title_id,
            email: &credential.email,
            password: &credential.password,
        };

        let result: LoginResult = self
            .call("LoginWithEmailAddress", &request, None)
            .await
            .map_err(auth_failure)?;

        Ok(into_session(result, LoginMethod::EmailPassword))
    }

    #[instrument(skip(self), fields(platform = %device.platform))]
    async fn login_with_device(&self, device: &DeviceId) -> Result<Session, Error> {
        let result: LoginResult = match device.platform {
            DevicePlatform::Android => {
                let request = LoginWithAndroidDeviceIdRequest {
                    title_id: &self.title_id,
                    android_device_id: &device.id,
                    create_account: true,
                };
                self.call("LoginWithAndroidDeviceID", &request, None).await
            }
            DevicePlatform::Ios => {
                let request = LoginWithIosDeviceIdRequest {
                    title_id: &self.title_id,
                    device_id: &device.id,
                    create_account: true,
                };
                self.call("LoginWithIOSDeviceID", &request, None).await
            }
            DevicePlatform::Desktop => {
                let request = LoginWithCustomIdRequest {
                    title_id: &self.title_id,
                    custom_id: &device.id,
                    create_account: true,
                };
                self.call("LoginWithCustomID", &request, None).await
            }
        }
        .map_err(auth_failure)?;

        if result.newly_created {
            info!(player_id = %result.playfab_id, "created account for device");
        }

        Ok(into_session(result, LoginMethod::Device))
    }

    #[instrument(skip(self, credential), fields(email = %credential.email))]
    async fn register(&self, credential: &Credential) -> Result<Session, Error> {
        let request = RegisterPlayFabUserRequest {
            title_id: &self.title_id,
            email: &credential.email,
            password: &credential.password,
            username: credential.display_name.as_deref(),
            require_both_username_and_email: credential.display_name.is_some(),
        };

        let result: RegisterPlayFabUserResult = self
            .call("RegisterPlayFabUser", &request, None)
            .await
            .map_err(auth_failure)?;

        info!(player_id = %result.playfab_id, username = ?result.username, "registered new player");

        Ok(Session {
            player_id: result.playfab_id,
            session_ticket: result.session_ticket,
            newly_created: true,
            method: LoginMethod::Registration,
        })
    }

    #[instrument(skip(self, session, credential), fields(email = %credential.email))]
    async fn add_username_password(
        &self,
        session: &Session,
        credential: &Credential,
    ) -> Result<(), Error> {
        let request = AddUsernamePasswordRequest {
            email: &credential.email,
            password: &credential.password,
            username: credential.display_name.as_deref(),
        };

        let result: AddUsernamePasswordResult = self
            .call("AddUsernamePassword", &request, Some(&session.session_ticket))
            .await
            .map_err(auth_failure)?;

        info!(username = ?result.username, "linked email login");
        Ok(())
    }
}
