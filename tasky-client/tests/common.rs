#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tasky_client::{ClientError, ClientResult, MemoryStorage, TaskApi, TaskStore};
use tasky_core::{CreateTaskData, Task, TaskStatus, UpdateTaskData};

/// In-process stand-in for the task service.
///
/// Canonical records differ from what the client sends in ways a real
/// server might: labels are lower-cased and every mutation bumps
/// `updated_at`. Tests use that to tell "replaced" apart from "merged".
#[derive(Default)]
pub struct FakeTaskApi {
    pub records: Mutex<Vec<Task>>,
    pub calls: Mutex<Vec<String>>,
    next_id: AtomicUsize,
    fail_with: Mutex<Option<(u16, String)>>,
    pub drop_ids: AtomicBool,
    pub drop_task: AtomicBool,
}

impl FakeTaskApi {
    pub fn with_records(records: Vec<Task>) -> Arc<Self> {
        let api = Self::default();
        *api.records.lock().unwrap() = records;
        Arc::new(api)
    }

    pub fn fail_next(&self, status: u16, message: &str) {
        *self.fail_with.lock().unwrap() = Some((status, message.to_string()));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn record(&self, id: &str) -> Option<Task> {
        self.records.lock().unwrap().iter().find(|t| t.id == id).cloned()
    }

    fn enter(&self, call: String) -> ClientResult<()> {
        self.calls.lock().unwrap().push(call);
        match self.fail_with.lock().unwrap().take() {
            Some((status, message)) => Err(ClientError::Api { status, message }),
            None => Ok(()),
        }
    }

    fn respond(&self, task: Task) -> Option<Task> {
        if self.drop_task.load(Ordering::SeqCst) {
            return None;
        }
        let mut task = task;
        if self.drop_ids.load(Ordering::SeqCst) {
            task.id.clear();
        }
        Some(task)
    }

    fn mutate(&self, id: &str, f: impl FnOnce(&mut Task)) -> ClientResult<Option<Task>> {
        let mut records = self.records.lock().unwrap();
        let Some(t) = records.iter_mut().find(|t| t.id == id) else {
            return Err(ClientError::Api {
                status: 404,
                message: "Task not found".into(),
            });
        };
        f(t);
        t.labels = t.labels.iter().map(|l| l.to_lowercase()).collect();
        t.updated_at = t.updated_at + Duration::seconds(1);
        let canonical = t.clone();
        drop(records);
        Ok(self.respond(canonical))
    }
}

#[async_trait]
impl TaskApi for FakeTaskApi {
    async fn list_tasks(&self) -> ClientResult<Vec<Task>> {
        self.enter("list".into())?;
        Ok(self.records.lock().unwrap().clone())
    }

    async fn list_tasks_by_status(&self, status: TaskStatus) -> ClientResult<Vec<Task>> {
        self.enter(format!("list:{}", status.as_str()))?;
        let records = self.records.lock().unwrap();
        Ok(records
            .iter()
            .filter(|t| match status {
                TaskStatus::Active => !t.is_completed && !t.is_deleted,
                TaskStatus::Completed => t.is_completed && !t.is_deleted,
                TaskStatus::Deleted => t.is_deleted,
            })
            .cloned()
            .collect())
    }

    async fn create_task(&self, draft: &CreateTaskData) -> ClientResult<Option<Task>> {
        self.enter(format!("create:{}", draft.title))?;
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let mut task = Task::new(format!("srv-{n}"), draft.title.clone())
            .with_priority(draft.priority)
            .with_labels(draft.labels.iter().map(|l| l.to_lowercase()));
        task.description = draft.description.clone();
        task.due_date = draft.due_date;
        task.project = draft.project.clone();
        task.created_at = Utc::now();
        task.updated_at = task.created_at;
        self.records.lock().unwrap().insert(0, task.clone());
        Ok(self.respond(task))
    }

    async fn update_task(&self, id: &str, patch: &UpdateTaskData) -> ClientResult<Option<Task>> {
        self.enter(format!("update:{id}"))?;
        self.mutate(id, |t| t.apply(patch))
    }

    async fn delete_task(&self, id: &str) -> ClientResult<()> {
        self.enter(format!("delete:{id}"))?;
        self.records.lock().unwrap().retain(|t| t.id != id);
        Ok(())
    }

    async fn complete_task(&self, id: &str) -> ClientResult<Option<Task>> {
        self.enter(format!("complete:{id}"))?;
        self.mutate(id, |t| t.is_completed = true)
    }

    async fn incomplete_task(&self, id: &str) -> ClientResult<Option<Task>> {
        self.enter(format!("incomplete:{id}"))?;
        self.mutate(id, |t| t.is_completed = false)
    }

    async fn restore_task(&self, id: &str) -> ClientResult<Option<Task>> {
        self.enter(format!("restore:{id}"))?;
        self.mutate(id, |t| t.is_deleted = false)
    }
}

pub fn store_with(api: Arc<FakeTaskApi>) -> (TaskStore, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    (TaskStore::new(api, storage.clone()), storage)
}

pub fn ids(tasks: &[Task]) -> Vec<&str> {
    tasks.iter().map(|t| t.id.as_str()).collect()
}
