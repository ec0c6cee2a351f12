//! Session store: who is signed in.
//!
//! `is_authenticated` is derived from the presence of a user, so the two can
//! never disagree. `{user, isAuthenticated}` is persisted after every change
//! to the user; `loading` and `error` stay in memory.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tasky_core::{User, UserPatch};
use tracing::{debug, info, warn};

use crate::storage::{SnapshotStorage, load_snapshot, save_snapshot};

pub const SESSION_KEY: &str = "session";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub user: Option<User>,
    pub loading: bool,
    pub error: Option<String>,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionSnapshot {
    user: Option<User>,
    #[serde(default)]
    is_authenticated: bool,
}

pub struct SessionStore {
    state: Mutex<SessionState>,
    storage: Arc<dyn SnapshotStorage>,
}

impl SessionStore {
    /// Restore from the persisted snapshot, or start signed out.
    pub fn new(storage: Arc<dyn SnapshotStorage>) -> Self {
        let user = load_snapshot::<SessionSnapshot>(storage.as_ref(), SESSION_KEY).and_then(|s| {
            if s.is_authenticated != s.user.is_some() {
                warn!(
                    is_authenticated = s.is_authenticated,
                    has_user = s.user.is_some(),
                    "session snapshot disagrees with itself; trusting the user record"
                );
            }
            s.user
        });
        if let Some(u) = &user {
            debug!(user = %u.user_name, "restored session");
        }

        Self {
            state: Mutex::new(SessionState {
                user,
                ..SessionState::default()
            }),
            storage,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, state: &SessionState) {
        let snapshot = SessionSnapshot {
            user: state.user.clone(),
            is_authenticated: state.is_authenticated(),
        };
        save_snapshot(self.storage.as_ref(), SESSION_KEY, &snapshot);
    }

    pub fn snapshot(&self) -> SessionState {
        self.lock().clone()
    }

    pub fn user(&self) -> Option<User> {
        self.lock().user.clone()
    }

    pub fn token(&self) -> Option<String> {
        self.lock()
            .user
            .as_ref()
            .filter(|u| u.has_token())
            .map(|u| u.token.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.lock().is_authenticated()
    }

    pub fn loading(&self) -> bool {
        self.lock().loading
    }

    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    /// Replace the session. `None` signs out.
    pub fn set_user(&self, user: Option<User>) {
        let mut state = self.lock();
        match &user {
            Some(u) => info!(user = %u.user_name, "signed in"),
            None => info!("session cleared"),
        }
        state.user = user;
        state.error = None;
        self.persist(&state);
    }

    /// Purely local: there is no server-side logout call.
    pub fn logout(&self) {
        let mut state = self.lock();
        if state.user.is_some() {
            info!("signed out");
        }
        state.user = None;
        state.error = None;
        self.persist(&state);
    }

    /// Merge profile fields into the current user. No-op when signed out.
    pub fn update_user_details(&self, patch: &UserPatch) {
        let mut state = self.lock();
        let Some(user) = state.user.as_mut() else {
            debug!("profile update ignored: no user signed in");
            return;
        };
        user.apply(patch);
        self.persist(&state);
    }

    pub fn set_loading(&self, loading: bool) {
        self.lock().loading = loading;
    }

    pub fn set_error(&self, error: Option<String>) {
        self.lock().error = error;
    }
}
