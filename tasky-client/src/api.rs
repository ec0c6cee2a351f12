//! HTTP adapter for the Tasky REST API.
//!
//! Every request carries `Authorization: Bearer <token>` when the session
//! has one. A 401 from any endpoint clears the session before the error is
//! returned, so callers only need to send the user back to sign-in.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tasky_core::{CreateTaskData, Task, TaskStatus, UpdateTaskData, User, UserPatch};
use tracing::{debug, warn};

use crate::error::{ClientError, ClientResult};
use crate::session::SessionStore;

pub const DEFAULT_BASE_URL: &str = "http://localhost:4000/api";

/// Task endpoints. Transitions return the server's canonical record, or
/// `None` when the envelope came back without one.
#[async_trait]
pub trait TaskApi: Send + Sync {
    async fn list_tasks(&self) -> ClientResult<Vec<Task>>;
    async fn list_tasks_by_status(&self, status: TaskStatus) -> ClientResult<Vec<Task>>;
    async fn create_task(&self, draft: &CreateTaskData) -> ClientResult<Option<Task>>;
    async fn update_task(&self, id: &str, patch: &UpdateTaskData) -> ClientResult<Option<Task>>;
    async fn delete_task(&self, id: &str) -> ClientResult<()>;
    async fn complete_task(&self, id: &str) -> ClientResult<Option<Task>>;
    async fn incomplete_task(&self, id: &str) -> ClientResult<Option<Task>>;
    async fn restore_task(&self, id: &str) -> ClientResult<Option<Task>>;
}

/// Auth and profile endpoints. Bodies the server leaves open are returned raw.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, email_or_username: &str, password: &str) -> ClientResult<AuthResponse>;
    async fn register(&self, registration: &Registration) -> ClientResult<Value>;
    async fn update_password(&self, current_password: &str, new_password: &str) -> ClientResult<Value>;
    async fn get_profile(&self) -> ClientResult<Value>;
    async fn update_profile(&self, update: &ProfileUpdate) -> ClientResult<Value>;
}

#[derive(Debug, Default, Deserialize)]
struct TasksEnvelope {
    #[serde(default)]
    tasks: Vec<Task>,
}

#[derive(Debug, Default, Deserialize)]
struct TaskEnvelope {
    #[serde(default)]
    task: Option<Task>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    pub username: String,
    pub email: String,
}

/// Body of a successful `POST /auth/login`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: AuthUser,
    pub token: String,
}

impl AuthResponse {
    pub fn into_user(self) -> User {
        let id = self.user.id.map(|v| match v {
            Value::String(s) => s,
            other => other.to_string(),
        });
        User {
            id,
            first_name: self.user.first_name.unwrap_or_default(),
            last_name: self.user.last_name.unwrap_or_default(),
            user_name: self.user.username,
            email_address: self.user.email,
            token: self.token,
            profile_picture: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Body of `PATCH /user/profile`; only the set fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn to_patch(&self) -> UserPatch {
        UserPatch {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            user_name: self.username.clone(),
            email_address: self.email.clone(),
            profile_picture: None,
        }
    }
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionStore>,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration, session: Arc<SessionStore>) -> ClientResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "api request");
        let rb = self.http.request(method, url);
        match self.session.token() {
            Some(token) => rb.header(AUTHORIZATION, format!("Bearer {token}")),
            None => rb,
        }
    }

    /// Send and map non-2xx statuses into errors.
    async fn execute(&self, rb: RequestBuilder) -> ClientResult<Response> {
        let resp = rb.send().await?;
        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            warn!("api rejected credentials; clearing session");
            self.session.logout();
            return Err(ClientError::Unauthorized);
        }
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: error_message(status, &txt),
            });
        }
        Ok(resp)
    }

    async fn send_json<T: DeserializeOwned + Default>(&self, rb: RequestBuilder) -> ClientResult<T> {
        let resp = self.execute(rb).await?;
        let bytes = resp.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(T::default());
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn send_task(&self, rb: RequestBuilder) -> ClientResult<Option<Task>> {
        let env: TaskEnvelope = self.send_json(rb).await?;
        Ok(env.task)
    }

    async fn send_tasks(&self, rb: RequestBuilder) -> ClientResult<Vec<Task>> {
        let env: TasksEnvelope = self.send_json(rb).await?;
        Ok(env.tasks)
    }
}

/// Prefer the server's `error`/`message` field over the raw body.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(v) = serde_json::from_str::<Value>(body) {
        for key in ["error", "message"] {
            if let Some(msg) = v.get(key).and_then(Value::as_str) {
                return msg.to_string();
            }
        }
    }
    let body = body.trim();
    if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body.to_string()
    }
}

#[async_trait]
impl TaskApi for ApiClient {
    async fn list_tasks(&self) -> ClientResult<Vec<Task>> {
        self.send_tasks(self.request(Method::GET, "/tasks")).await
    }

    async fn list_tasks_by_status(&self, status: TaskStatus) -> ClientResult<Vec<Task>> {
        let rb = self
            .request(Method::GET, "/tasks")
            .query(&[("status", status.as_str())]);
        self.send_tasks(rb).await
    }

    async fn create_task(&self, draft: &CreateTaskData) -> ClientResult<Option<Task>> {
        self.send_task(self.request(Method::POST, "/tasks").json(draft))
            .await
    }

    async fn update_task(&self, id: &str, patch: &UpdateTaskData) -> ClientResult<Option<Task>> {
        let rb = self
            .request(Method::PATCH, &format!("/tasks/{id}"))
            .json(patch);
        self.send_task(rb).await
    }

    async fn delete_task(&self, id: &str) -> ClientResult<()> {
        self.execute(self.request(Method::DELETE, &format!("/tasks/{id}")))
            .await?;
        Ok(())
    }

    async fn complete_task(&self, id: &str) -> ClientResult<Option<Task>> {
        self.send_task(self.request(Method::PATCH, &format!("/tasks/complete/{id}")))
            .await
    }

    async fn incomplete_task(&self, id: &str) -> ClientResult<Option<Task>> {
        self.send_task(self.request(Method::PATCH, &format!("/tasks/incomplete/{id}")))
            .await
    }

    async fn restore_task(&self, id: &str) -> ClientResult<Option<Task>> {
        self.send_task(self.request(Method::PATCH, &format!("/tasks/restore/{id}")))
            .await
    }
}

#[async_trait]
impl AuthApi for ApiClient {
    async fn login(&self, email_or_username: &str, password: &str) -> ClientResult<AuthResponse> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Req<'a> {
            email_or_username: &'a str,
            password: &'a str,
        }

        let rb = self.request(Method::POST, "/auth/login").json(&Req {
            email_or_username,
            password,
        });
        let resp = self.execute(rb).await?;
        let bytes = resp.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ClientError::InvalidResponse(format!("login response: {e}")))
    }

    async fn register(&self, registration: &Registration) -> ClientResult<Value> {
        self.send_json(self.request(Method::POST, "/auth/register").json(registration))
            .await
    }

    async fn update_password(&self, current_password: &str, new_password: &str) -> ClientResult<Value> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Req<'a> {
            current_password: &'a str,
            new_password: &'a str,
        }

        let rb = self.request(Method::PATCH, "/auth/password").json(&Req {
            current_password,
            new_password,
        });
        self.send_json(rb).await
    }

    async fn get_profile(&self) -> ClientResult<Value> {
        self.send_json(self.request(Method::GET, "/user/profile"))
            .await
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> ClientResult<Value> {
        self.send_json(self.request(Method::PATCH, "/user/profile").json(update))
            .await
    }
}
