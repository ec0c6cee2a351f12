//! Task store: the local cache of the user's tasks.
//!
//! Two kinds of operations live here and must not be confused:
//!
//! - network-backed (`fetch_tasks`, `create_task`, `mark_complete`, ...):
//!   call the API, then reconcile the cache with the server's answer. The
//!   cached entry is replaced by the canonical record, never merged with
//!   what the caller sent.
//! - local-only (`set_tasks`, `add_task`, `update_task`, ...): edit the cache
//!   for a caller that already holds the right record. Nothing is sent to
//!   the server.
//!
//! Every network-backed action sets `loading` and clears `error` on entry.
//! On failure it records the message, clears `loading`, leaves the cache as
//! it was and returns the error. The task list is persisted after every
//! change to it.
//!
//! Concurrent actions on the same id race: whichever response lands last
//! wins. There is no version check.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tasky_core::{CreateTaskData, FilterCriteria, Task, UpdateTaskData, View, derive_view};
use tracing::{debug, info, warn};

use crate::api::TaskApi;
use crate::error::{ClientError, ClientResult};
use crate::storage::{SnapshotStorage, load_snapshot, save_snapshot};

pub const TASKS_KEY: &str = "tasks";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskState {
    /// Server order; tasks created locally are prepended.
    pub tasks: Vec<Task>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TasksSnapshot {
    #[serde(default)]
    tasks: Vec<Task>,
}

pub struct TaskStore {
    api: Arc<dyn TaskApi>,
    storage: Arc<dyn SnapshotStorage>,
    state: Mutex<TaskState>,
}

/// Require a usable canonical record from a mutation response.
fn canonical(task: Option<Task>) -> ClientResult<Task> {
    match task {
        Some(t) if t.has_identity() => Ok(t),
        Some(_) => Err(ClientError::InvalidResponse("task has no id".into())),
        None => Err(ClientError::InvalidResponse("response carried no task".into())),
    }
}

fn replace_entry(tasks: &mut [Task], id: &str, canonical: Task) {
    match tasks.iter_mut().find(|t| t.id == id) {
        Some(slot) => *slot = canonical,
        None => debug!(id, "canonical task not in cache; nothing to replace"),
    }
}

impl TaskStore {
    /// Restore the cached list from storage, or start empty.
    pub fn new(api: Arc<dyn TaskApi>, storage: Arc<dyn SnapshotStorage>) -> Self {
        let tasks = load_snapshot::<TasksSnapshot>(storage.as_ref(), TASKS_KEY)
            .map(|s| s.tasks)
            .unwrap_or_default();
        debug!(count = tasks.len(), "restored task cache");

        Self {
            api,
            storage,
            state: Mutex::new(TaskState {
                tasks,
                ..TaskState::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TaskState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, state: &TaskState) {
        save_snapshot(
            self.storage.as_ref(),
            TASKS_KEY,
            &TasksSnapshot {
                tasks: state.tasks.clone(),
            },
        );
    }

    /// Apply a local change to the list and persist it.
    fn commit(&self, change: impl FnOnce(&mut Vec<Task>)) {
        let mut state = self.lock();
        change(&mut state.tasks);
        self.persist(&state);
    }

    fn begin(&self) {
        let mut state = self.lock();
        state.loading = true;
        state.error = None;
    }

    /// Close out a network-backed action: reconcile on success, record on failure.
    fn finish<T>(
        &self,
        action: &str,
        result: ClientResult<T>,
        reconcile: impl FnOnce(&mut Vec<Task>, &T),
    ) -> ClientResult<T> {
        let mut state = self.lock();
        state.loading = false;
        match result {
            Ok(value) => {
                reconcile(&mut state.tasks, &value);
                self.persist(&state);
                Ok(value)
            }
            Err(e) => {
                warn!(action, error = %e, "task action failed");
                state.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    // --- reads ---------------------------------------------------------

    pub fn snapshot(&self) -> TaskState {
        self.lock().clone()
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.lock().tasks.clone()
    }

    pub fn get(&self, id: &str) -> Option<Task> {
        self.lock().tasks.iter().find(|t| t.id == id).cloned()
    }

    pub fn loading(&self) -> bool {
        self.lock().loading
    }

    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    /// Derive a dashboard view from the current cache.
    pub fn view(&self, view: View, criteria: &FilterCriteria, today: NaiveDate) -> Vec<Task> {
        let state = self.lock();
        derive_view(&state.tasks, view, criteria, today)
            .into_iter()
            .cloned()
            .collect()
    }

    // --- network-backed ------------------------------------------------

    /// Replace the whole cache with the server's list.
    pub async fn fetch_tasks(&self) -> ClientResult<Vec<Task>> {
        self.begin();
        let result = self.api.list_tasks().await.and_then(|tasks| {
            if tasks.iter().any(|t| !t.has_identity()) {
                return Err(ClientError::InvalidResponse("task list contains a task without an id".into()));
            }
            Ok(tasks)
        });
        let out = self.finish("fetch_tasks", result, |cache, fresh| {
            *cache = fresh.clone();
        })?;
        info!(count = out.len(), "task cache refreshed");
        Ok(out)
    }

    /// Create on the server and prepend the canonical task.
    ///
    /// A blank title is a caller bug: it is rejected before any state change
    /// and never recorded as the store's error.
    pub async fn create_task(&self, draft: &CreateTaskData) -> ClientResult<Task> {
        if !draft.has_title() {
            return Err(ClientError::BlankTitle);
        }
        self.begin();
        let result = self.api.create_task(draft).await.and_then(canonical);
        let task = self.finish("create_task", result, |cache, task| {
            cache.retain(|t| t.id != task.id);
            cache.insert(0, task.clone());
        })?;
        info!(id = %task.id, "task created");
        Ok(task)
    }

    pub async fn update_task_async(&self, id: &str, patch: &UpdateTaskData) -> ClientResult<Task> {
        self.begin();
        let result = self.api.update_task(id, patch).await.and_then(canonical);
        self.finish("update_task", result, |cache, task| {
            replace_entry(cache, id, task.clone())
        })
    }

    pub async fn mark_complete(&self, id: &str) -> ClientResult<Task> {
        self.begin();
        let result = self.api.complete_task(id).await.and_then(canonical);
        self.finish("mark_complete", result, |cache, task| {
            replace_entry(cache, id, task.clone())
        })
    }

    pub async fn mark_incomplete(&self, id: &str) -> ClientResult<Task> {
        self.begin();
        let result = self.api.incomplete_task(id).await.and_then(canonical);
        self.finish("mark_incomplete", result, |cache, task| {
            replace_entry(cache, id, task.clone())
        })
    }

    /// Flip completion based on the cached copy. `Ok(None)` when `id` is not cached.
    pub async fn toggle_complete_async(&self, id: &str) -> ClientResult<Option<Task>> {
        let Some(current) = self.get(id) else {
            return Ok(None);
        };
        let task = if current.is_completed {
            self.mark_incomplete(id).await?
        } else {
            self.mark_complete(id).await?
        };
        Ok(Some(task))
    }

    /// Clear the soft-delete marker via the server.
    pub async fn restore_task_async(&self, id: &str) -> ClientResult<Task> {
        self.begin();
        let result = self.api.restore_task(id).await.and_then(canonical);
        self.finish("restore_task", result, |cache, task| {
            replace_entry(cache, id, task.clone())
        })
    }

    /// Delete on the server and drop the entry from the cache.
    pub async fn delete_task_async(&self, id: &str) -> ClientResult<()> {
        self.begin();
        let result = self.api.delete_task(id).await;
        self.finish("delete_task", result, |cache, _| {
            cache.retain(|t| t.id != id)
        })?;
        info!(id, "task deleted");
        Ok(())
    }

    // --- local-only ----------------------------------------------------

    pub fn set_tasks(&self, tasks: Vec<Task>) {
        self.commit(|cache| *cache = tasks);
    }

    pub fn add_task(&self, task: Task) {
        self.commit(|cache| cache.insert(0, task));
    }

    /// Shallow-merge `patch` into the cached copy.
    pub fn update_task(&self, id: &str, patch: &UpdateTaskData) {
        self.commit(|cache| {
            if let Some(t) = cache.iter_mut().find(|t| t.id == id) {
                t.apply(patch);
            }
        });
    }

    pub fn delete_task(&self, id: &str) {
        self.commit(|cache| cache.retain(|t| t.id != id));
    }

    pub fn toggle_complete(&self, id: &str) {
        self.commit(|cache| {
            if let Some(t) = cache.iter_mut().find(|t| t.id == id) {
                t.is_completed = !t.is_completed;
            }
        });
    }

    pub fn restore_task(&self, id: &str) {
        self.commit(|cache| {
            if let Some(t) = cache.iter_mut().find(|t| t.id == id) {
                t.is_deleted = false;
            }
        });
    }

    pub fn set_loading(&self, loading: bool) {
        self.lock().loading = loading;
    }

    pub fn set_error(&self, error: Option<String>) {
        self.lock().error = error;
    }
}
