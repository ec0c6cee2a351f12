//! tasky-core: domain types and view derivation for the Tasky client

pub mod task;
pub mod time;
pub mod user;
pub mod view;

pub use task::{CreateTaskData, Priority, Task, TaskStatus, UpdateTaskData, parse_labels};
pub use time::{calendar_day, parse_due_date, parse_timezone};
pub use user::{User, UserPatch};
pub use view::{FilterCriteria, UPCOMING_WINDOW_DAYS, View, derive_view, view_counts};
