use std::sync::Arc;
use std::time::Duration;

use crate::account::AccountService;
use crate::api::ApiClient;
use crate::error::ClientResult;
use crate::session::SessionStore;
use crate::storage::SnapshotStorage;
use crate::task_store::TaskStore;

/// Everything one application session needs, wired together once and
/// handed to the presentation layer.
pub struct TaskyClient {
    pub session: Arc<SessionStore>,
    pub api: Arc<ApiClient>,
    pub tasks: TaskStore,
    pub account: AccountService,
}

impl TaskyClient {
    /// Snapshots are restored here, before any store action can run.
    pub fn new(base_url: &str, timeout: Duration, storage: Arc<dyn SnapshotStorage>) -> ClientResult<Self> {
        let session = Arc::new(SessionStore::new(storage.clone()));
        let api = Arc::new(ApiClient::new(base_url, timeout, session.clone())?);
        let tasks = TaskStore::new(api.clone(), storage);
        let account = AccountService::new(api.clone(), session.clone());

        Ok(Self {
            session,
            api,
            tasks,
            account,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// End the session and drop the cached tasks that belonged to it, so the
    /// next user on this machine never sees them.
    pub fn sign_out(&self) {
        self.account.logout();
        self.tasks.set_tasks(Vec::new());
    }
}
