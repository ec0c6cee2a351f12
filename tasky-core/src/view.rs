//! Dashboard views: which slice of the task cache a screen shows.
//!
//! Derivation is a pure function of `(tasks, view, criteria, today)`.
//! Order of application:
//! 1. drop soft-deleted tasks (Trash keeps only them and stops here)
//! 2. AND together every active filter criterion
//! 3. narrow by view; Completed and Inbox start over from the whole cache,
//!    so filters have no effect on those two views

use anyhow::{Result, bail};
use chrono::{Duration, NaiveDate};
use std::fmt;
use std::str::FromStr;

use crate::task::{Priority, Task};

/// How far ahead the Upcoming view looks, in days.
pub const UPCOMING_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum View {
    #[default]
    MyTasks,
    Inbox,
    Today,
    Upcoming,
    Completed,
    Trash,
}

impl View {
    pub const ALL: [View; 6] = [
        View::MyTasks,
        View::Inbox,
        View::Today,
        View::Upcoming,
        View::Completed,
        View::Trash,
    ];

    pub fn label(self) -> &'static str {
        match self {
            View::MyTasks => "My Tasks",
            View::Inbox => "Inbox",
            View::Today => "Today",
            View::Upcoming => "Upcoming",
            View::Completed => "Completed",
            View::Trash => "Trash",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            View::MyTasks => "my-tasks",
            View::Inbox => "inbox",
            View::Today => "today",
            View::Upcoming => "upcoming",
            View::Completed => "completed",
            View::Trash => "trash",
        }
    }

    /// Whether filter criteria influence this view at all.
    pub fn honors_filters(self) -> bool {
        matches!(self, View::MyTasks | View::Today | View::Upcoming)
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for View {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let norm = s.trim().to_ascii_lowercase().replace([' ', '_'], "-");
        for v in View::ALL {
            if v.slug() == norm {
                return Ok(v);
            }
        }
        bail!("unknown view '{s}' (expected one of: my-tasks, inbox, today, upcoming, completed, trash)")
    }
}

/// Optional filters, combined with AND. Blank strings count as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    /// Case-insensitive substring of the title.
    pub title: Option<String>,
    /// Exact calendar day of the due date.
    pub due_date: Option<NaiveDate>,
    pub priority: Option<Priority>,
    /// Exact project name.
    pub project: Option<String>,
    /// Must be one of the task's labels.
    pub label: Option<String>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_due_date(mut self, due: NaiveDate) -> Self {
        self.due_date = Some(due);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        active(&self.title).is_none()
            && self.due_date.is_none()
            && self.priority.is_none()
            && active(&self.project).is_none()
            && active(&self.label).is_none()
    }

    pub fn matches(&self, task: &Task) -> bool {
        if let Some(needle) = active(&self.title) {
            if !task.title.to_lowercase().contains(&needle.to_lowercase()) {
                return false;
            }
        }
        if let Some(day) = self.due_date {
            if task.due_date != Some(day) {
                return false;
            }
        }
        if let Some(priority) = self.priority {
            if task.priority != priority {
                return false;
            }
        }
        if let Some(project) = active(&self.project) {
            let on_project = task
                .project
                .as_deref()
                .is_some_and(|p| !p.trim().is_empty() && p == project);
            if !on_project {
                return false;
            }
        }
        if let Some(label) = active(&self.label) {
            if !task.labels.iter().any(|l| l == label) {
                return false;
            }
        }
        true
    }
}

fn active(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Compute the visible tasks for `view`, preserving cache order.
///
/// `today` is the viewer's current calendar day; it anchors Today and
/// Upcoming and keeps the function free of clock reads.
pub fn derive_view<'a>(
    tasks: &'a [Task],
    view: View,
    criteria: &FilterCriteria,
    today: NaiveDate,
) -> Vec<&'a Task> {
    match view {
        View::Trash => return tasks.iter().filter(|t| t.is_deleted).collect(),
        View::Completed => {
            return tasks
                .iter()
                .filter(|t| t.is_completed && !t.is_deleted)
                .collect();
        }
        View::Inbox => return tasks.iter().filter(|t| !t.is_deleted).collect(),
        View::MyTasks | View::Today | View::Upcoming => {}
    }

    let horizon = today + Duration::days(UPCOMING_WINDOW_DAYS);

    tasks
        .iter()
        .filter(|t| !t.is_deleted)
        .filter(|t| criteria.matches(t))
        .filter(|t| match view {
            View::MyTasks => !t.is_completed,
            View::Today => t.due_date == Some(today),
            View::Upcoming => {
                !t.is_completed && t.due_date.is_some_and(|d| d > today && d <= horizon)
            }
            _ => unreachable!("handled above"),
        })
        .collect()
}

/// Number of visible tasks per view, for a sidebar or summary line.
pub fn view_counts(
    tasks: &[Task],
    criteria: &FilterCriteria,
    today: NaiveDate,
) -> Vec<(View, usize)> {
    View::ALL
        .iter()
        .map(|&v| (v, derive_view(tasks, v, criteria, today).len()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ids(v: Vec<&Task>) -> Vec<&str> {
        v.into_iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn my_tasks_hides_completed() {
        let tasks = vec![
            Task::new("1", "A"),
            Task::new("2", "B").completed(true),
        ];
        let out = derive_view(&tasks, View::MyTasks, &FilterCriteria::new(), day(2026, 2, 20));
        assert_eq!(ids(out), vec!["1"]);
    }

    #[test]
    fn trash_shows_only_deleted() {
        let tasks = vec![Task::new("1", "A").deleted(true), Task::new("2", "B")];
        let out = derive_view(&tasks, View::Trash, &FilterCriteria::new(), day(2026, 2, 20));
        assert_eq!(ids(out), vec!["1"]);
    }

    #[test]
    fn filters_compose_with_and() {
        let tasks = vec![
            Task::new("1", "Write Report")
                .with_priority(Priority::High)
                .with_project("Work")
                .with_labels(["q1"]),
            Task::new("2", "report expenses")
                .with_priority(Priority::Low)
                .with_project("Work"),
            Task::new("3", "Groceries").with_priority(Priority::High),
        ];
        let today = day(2026, 2, 20);

        let by_title = FilterCriteria::new().with_title("REPORT");
        assert_eq!(ids(derive_view(&tasks, View::MyTasks, &by_title, today)), vec!["1", "2"]);

        let narrowed = by_title.clone().with_priority(Priority::High).with_label("q1");
        assert_eq!(ids(derive_view(&tasks, View::MyTasks, &narrowed, today)), vec!["1"]);

        let by_project = FilterCriteria::new().with_project("Work");
        assert_eq!(ids(derive_view(&tasks, View::MyTasks, &by_project, today)), vec!["1", "2"]);
    }

    #[test]
    fn completed_and_inbox_ignore_filters() {
        let tasks = vec![
            Task::new("1", "alpha").completed(true),
            Task::new("2", "beta"),
            Task::new("3", "gamma").completed(true).deleted(true),
        ];
        let criteria = FilterCriteria::new().with_title("zzz");
        let today = day(2026, 2, 20);

        assert_eq!(ids(derive_view(&tasks, View::Completed, &criteria, today)), vec!["1"]);
        assert_eq!(ids(derive_view(&tasks, View::Inbox, &criteria, today)), vec!["1", "2"]);
        assert!(derive_view(&tasks, View::MyTasks, &criteria, today).is_empty());
    }

    #[test]
    fn today_and_upcoming_use_calendar_days() {
        let today = day(2026, 2, 20);
        let tasks = vec![
            Task::new("due-today", "a").with_due_date(today),
            Task::new("tomorrow", "b").with_due_date(day(2026, 2, 21)),
            Task::new("edge", "c").with_due_date(day(2026, 2, 27)),
            Task::new("too-far", "d").with_due_date(day(2026, 2, 28)),
            Task::new("done-soon", "e").with_due_date(day(2026, 2, 22)).completed(true),
            Task::new("undated", "f"),
        ];
        let none = FilterCriteria::new();

        assert_eq!(ids(derive_view(&tasks, View::Today, &none, today)), vec!["due-today"]);
        assert_eq!(
            ids(derive_view(&tasks, View::Upcoming, &none, today)),
            vec!["tomorrow", "edge"]
        );
    }

    #[test]
    fn due_filter_matches_exact_day() {
        let tasks = vec![
            Task::new("1", "a").with_due_date(day(2026, 2, 24)),
            Task::new("2", "b").with_due_date(day(2026, 2, 25)),
            Task::new("3", "c"),
        ];
        let criteria = FilterCriteria::new().with_due_date(day(2026, 2, 24));
        let out = derive_view(&tasks, View::MyTasks, &criteria, day(2026, 2, 20));
        assert_eq!(ids(out), vec!["1"]);
    }

    #[test]
    fn filters_narrow_today_and_upcoming() {
        let today = day(2026, 2, 20);
        let tasks = vec![
            Task::new("1", "pay rent").with_due_date(today).with_priority(Priority::High),
            Task::new("2", "walk dog").with_due_date(today),
            Task::new("3", "pay bills").with_due_date(day(2026, 2, 23)),
            Task::new("4", "book flights").with_due_date(day(2026, 2, 24)),
        ];

        let high = FilterCriteria::new().with_priority(Priority::High);
        assert_eq!(ids(derive_view(&tasks, View::Today, &high, today)), vec!["1"]);

        let pay = FilterCriteria::new().with_title("pay");
        assert_eq!(ids(derive_view(&tasks, View::Upcoming, &pay, today)), vec!["3"]);
    }

    #[test]
    fn trash_ignores_filters() {
        let tasks = vec![
            Task::new("1", "alpha"),
            Task::new("3", "gamma").deleted(true).with_priority(Priority::Low),
        ];
        let criteria = FilterCriteria::new()
            .with_title("zzz")
            .with_priority(Priority::High);
        let out = derive_view(&tasks, View::Trash, &criteria, day(2026, 2, 20));
        assert_eq!(ids(out), vec!["3"]);
    }

    #[test]
    fn derivation_is_repeatable() {
        let tasks = vec![
            Task::new("1", "x").with_due_date(day(2026, 2, 21)),
            Task::new("2", "y"),
        ];
        let criteria = FilterCriteria::new().with_title("x");
        let today = day(2026, 2, 20);
        for v in View::ALL {
            assert_eq!(
                derive_view(&tasks, v, &criteria, today),
                derive_view(&tasks, v, &criteria, today)
            );
        }
    }

    #[test]
    fn blank_criteria_are_inactive() {
        let c = FilterCriteria::new().with_title("").with_project("");
        assert!(c.is_empty());
        assert!(c.matches(&Task::new("1", "anything")));
    }

    #[test]
    fn parses_view_names() {
        assert_eq!("my tasks".parse::<View>().unwrap(), View::MyTasks);
        assert_eq!("Trash".parse::<View>().unwrap(), View::Trash);
        assert!("archive".parse::<View>().is_err());
    }

    #[test]
    fn counts_cover_every_view() {
        let tasks = vec![Task::new("1", "a"), Task::new("2", "b").deleted(true)];
        let counts = view_counts(&tasks, &FilterCriteria::new(), day(2026, 2, 20));
        assert_eq!(counts.len(), 6);
        assert!(counts.contains(&(View::Trash, 1)));
        assert!(counts.contains(&(View::MyTasks, 1)));
    }
}
