//! Sign-in, registration and profile workflows on top of the session store.
//!
//! Each workflow drives the session's `loading`/`error` the same way the
//! task store drives its own. Local input checks (matching passwords,
//! minimum length, required fields) fail before anything is sent and are
//! not recorded as session errors.

use serde_json::Value;
use std::sync::Arc;
use tasky_core::{User, UserPatch};
use tracing::{info, warn};

use crate::api::{AuthApi, AuthResponse, ProfileUpdate, Registration};
use crate::error::{ClientError, ClientResult};
use crate::session::SessionStore;

pub const MIN_PASSWORD_LEN: usize = 6;

pub struct AccountService {
    api: Arc<dyn AuthApi>,
    session: Arc<SessionStore>,
}

impl AccountService {
    pub fn new(api: Arc<dyn AuthApi>, session: Arc<SessionStore>) -> Self {
        Self { api, session }
    }

    fn begin(&self) {
        self.session.set_loading(true);
        self.session.set_error(None);
    }

    fn finish<T>(&self, action: &str, result: ClientResult<T>) -> ClientResult<T> {
        self.session.set_loading(false);
        if let Err(e) = &result {
            warn!(action, error = %e, "account action failed");
            self.session.set_error(Some(e.to_string()));
        }
        result
    }

    /// Exchange credentials for a token and start a session.
    pub async fn login(&self, email_or_username: &str, password: &str) -> ClientResult<User> {
        let identifier = email_or_username.trim();
        if identifier.is_empty() || password.is_empty() {
            return Err(ClientError::Validation("identifier and password are required".into()));
        }
        self.begin();
        let result = match self.api.login(identifier, password).await {
            Ok(resp) => Ok(resp.into_user()),
            // A 401 here means bad credentials, not an expired session.
            Err(ClientError::Unauthorized) => Err(ClientError::Api {
                status: 401,
                message: "invalid credentials".into(),
            }),
            Err(e) => Err(e),
        };
        let user = self.finish("login", result)?;
        self.session.set_user(Some(user.clone()));
        Ok(user)
    }

    /// Create an account and sign in.
    ///
    /// Uses the `{user, token}` from the registration response when the
    /// server sends one, otherwise logs in with the new credentials.
    pub async fn register(&self, registration: &Registration) -> ClientResult<User> {
        validate_registration(registration)?;
        self.begin();
        let result = self.api.register(registration).await;
        let body = self.finish("register", result)?;

        if let Ok(resp) = serde_json::from_value::<AuthResponse>(body) {
            let user = resp.into_user();
            info!(user = %user.user_name, "registered");
            self.session.set_user(Some(user.clone()));
            return Ok(user);
        }
        self.login(&registration.username, &registration.password)
            .await
    }

    /// Pull the server's profile into the session.
    pub async fn fetch_profile(&self) -> ClientResult<UserPatch> {
        self.begin();
        let result = self.api.get_profile().await;
        let body = self.finish("fetch_profile", result)?;
        let patch = profile_patch(&body);
        self.session.update_user_details(&patch);
        Ok(patch)
    }

    /// Send a profile change, then mirror it into the session.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> ClientResult<()> {
        if update.is_empty() {
            return Err(ClientError::Validation("nothing to update".into()));
        }
        self.begin();
        let result = self.api.update_profile(update).await;
        self.finish("update_profile", result)?;
        self.session.update_user_details(&update.to_patch());
        Ok(())
    }

    pub async fn change_password(&self, current: &str, new: &str, confirm: &str) -> ClientResult<()> {
        if new != confirm {
            return Err(ClientError::Validation("new passwords do not match".into()));
        }
        if new.chars().count() < MIN_PASSWORD_LEN {
            return Err(ClientError::Validation(format!(
                "new password must be at least {MIN_PASSWORD_LEN} characters long"
            )));
        }
        self.begin();
        let result = self.api.update_password(current, new).await;
        self.finish("change_password", result)?;
        info!("password updated");
        Ok(())
    }

    /// Attach a profile picture reference to the signed-in user.
    ///
    /// Local only: the server has no picture endpoint, so the reference
    /// lives in the persisted session until the next profile fetch.
    pub fn set_profile_picture(&self, reference: &str) -> ClientResult<()> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(ClientError::Validation("picture reference is required".into()));
        }
        if !self.session.is_authenticated() {
            return Err(ClientError::Validation("not signed in".into()));
        }
        self.session.update_user_details(&UserPatch {
            profile_picture: Some(reference.to_string()),
            ..UserPatch::default()
        });
        Ok(())
    }

    pub fn logout(&self) {
        self.session.logout();
    }
}

fn validate_registration(r: &Registration) -> ClientResult<()> {
    for (field, value) in [
        ("first name", &r.first_name),
        ("last name", &r.last_name),
        ("username", &r.username),
        ("email", &r.email),
    ] {
        if value.trim().is_empty() {
            return Err(ClientError::Validation(format!("{field} is required")));
        }
    }
    if !r.email.contains('@') {
        return Err(ClientError::Validation("email address looks invalid".into()));
    }
    if r.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ClientError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters long"
        )));
    }
    Ok(())
}

/// Read profile fields from either `{user: {...}}` or a bare object.
fn profile_patch(body: &Value) -> UserPatch {
    let src = body.get("user").unwrap_or(body);
    let field = |key: &str| src.get(key).and_then(Value::as_str).map(str::to_string);
    UserPatch {
        first_name: field("firstName"),
        last_name: field("lastName"),
        user_name: field("username"),
        email_address: field("email"),
        profile_picture: field("profilePicture"),
    }
}
