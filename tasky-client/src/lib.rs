//! tasky-client: API adapter, session/task stores and snapshot persistence

pub mod account;
pub mod api;
pub mod client;
pub mod error;
pub mod session;
pub mod storage;
pub mod task_store;

pub use account::AccountService;
pub use api::{ApiClient, AuthApi, AuthResponse, DEFAULT_BASE_URL, ProfileUpdate, Registration, TaskApi};
pub use client::TaskyClient;
pub use error::{ClientError, ClientResult};
pub use session::{SessionState, SessionStore};
pub use storage::{FileStorage, MemoryStorage, SnapshotStorage};
pub use task_store::{TaskState, TaskStore};
