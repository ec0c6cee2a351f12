use anyhow::{Result, bail};
use chrono::{NaiveDate, Utc};
use clap::{Args, Subcommand};
use tasky_client::{ClientError, TaskApi, TaskyClient};
use tasky_core::{
    CreateTaskData, FilterCriteria, Priority, TaskStatus, UpdateTaskData, View, calendar_day,
    parse_due_date, parse_labels, view_counts,
};
use tracing::debug;

use crate::auth::require_session;
use crate::config::Config;
use crate::render::{print_view, task_line};

#[derive(Subcommand, Debug)]
pub enum TasksCommand {
    /// Show one view of the task list (refreshes from the server first)
    List {
        #[arg(long, default_value = "my-tasks", value_parser = parse_view)]
        view: View,

        #[command(flatten)]
        filters: FilterArgs,

        /// Use the cached list without contacting the server
        #[arg(long)]
        offline: bool,
    },

    /// Per-view counts of the cached list
    Summary,

    /// Replace the cached list with the server's
    Sync,

    /// Create a task
    Add {
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_parser = parse_due_date)]
        due: Option<NaiveDate>,
        #[arg(long, default_value = "medium", value_parser = parse_priority)]
        priority: Priority,
        #[arg(long)]
        project: Option<String>,
        /// Comma-separated, e.g. "home, errands"
        #[arg(long)]
        labels: Option<String>,
    },

    /// Change fields of an existing task
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_parser = parse_due_date)]
        due: Option<NaiveDate>,
        #[arg(long, value_parser = parse_priority)]
        priority: Option<Priority>,
        #[arg(long)]
        project: Option<String>,
        #[arg(long)]
        labels: Option<String>,
    },

    /// Mark a task completed
    Done { id: String },

    /// Mark a task not completed
    Undo { id: String },

    /// Flip completion based on the cached copy
    Toggle { id: String },

    /// Delete a task
    Delete { id: String },

    /// Bring a task back from the trash
    Restore { id: String },

    /// Ask the server for one status bucket; the cache is left as is
    Remote {
        #[arg(long, value_parser = parse_status)]
        status: TaskStatus,
    },
}

#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    /// Case-insensitive title substring
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long, value_parser = parse_due_date)]
    pub due: Option<NaiveDate>,
    #[arg(long, value_parser = parse_priority)]
    pub priority: Option<Priority>,
    #[arg(long)]
    pub project: Option<String>,
    #[arg(long)]
    pub label: Option<String>,
}

impl FilterArgs {
    pub fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            title: self.title.clone(),
            due_date: self.due,
            priority: self.priority,
            project: self.project.clone(),
            label: self.label.clone(),
        }
    }
}

fn parse_view(s: &str) -> Result<View> {
    s.parse()
}

fn parse_priority(s: &str) -> Result<Priority> {
    s.parse()
}

fn parse_status(s: &str) -> Result<TaskStatus> {
    s.parse()
}

pub fn build_draft(
    title: &str,
    description: Option<&str>,
    due: Option<NaiveDate>,
    priority: Priority,
    project: Option<&str>,
    labels: Option<&str>,
) -> Result<CreateTaskData> {
    Ok(CreateTaskData::new(title)?
        .with_description(description)
        .with_due_date(due)
        .with_priority(priority)
        .with_project(project)
        .with_labels(labels.map(parse_labels).unwrap_or_default()))
}

fn today(cfg: &Config) -> Result<NaiveDate> {
    calendar_day(Utc::now(), &cfg.display.timezone)
}

pub async fn run(client: &TaskyClient, cfg: &Config, command: TasksCommand) -> Result<()> {
    match command {
        TasksCommand::List {
            view,
            filters,
            offline,
        } => list(client, cfg, view, &filters.criteria(), offline).await,

        TasksCommand::Summary => {
            let tasks = client.tasks.tasks();
            for (view, n) in view_counts(&tasks, &FilterCriteria::default(), today(cfg)?) {
                println!("{:<10} {n}", view.label());
            }
            Ok(())
        }

        TasksCommand::Sync => {
            require_session(client)?;
            let tasks = client.tasks.fetch_tasks().await?;
            println!("Synced {} tasks.", tasks.len());
            Ok(())
        }

        TasksCommand::Add {
            title,
            description,
            due,
            priority,
            project,
            labels,
        } => {
            require_session(client)?;
            let draft = build_draft(
                &title,
                description.as_deref(),
                due,
                priority,
                project.as_deref(),
                labels.as_deref(),
            )?;
            let task = client.tasks.create_task(&draft).await?;
            println!("Created {}", task_line(&task));
            Ok(())
        }

        TasksCommand::Edit {
            id,
            title,
            description,
            due,
            priority,
            project,
            labels,
        } => {
            require_session(client)?;
            if title.as_deref().is_some_and(|t| t.trim().is_empty()) {
                return Err(ClientError::BlankTitle.into());
            }
            let patch = UpdateTaskData {
                title,
                description,
                due_date: due,
                priority,
                project,
                labels: labels.as_deref().map(parse_labels),
                is_completed: None,
            };
            if patch.is_empty() {
                bail!("nothing to change (pass at least one field)");
            }
            let task = client.tasks.update_task_async(&id, &patch).await?;
            println!("Updated {}", task_line(&task));
            Ok(())
        }

        TasksCommand::Done { id } => {
            require_session(client)?;
            let task = client.tasks.mark_complete(&id).await?;
            println!("{}", task_line(&task));
            Ok(())
        }

        TasksCommand::Undo { id } => {
            require_session(client)?;
            let task = client.tasks.mark_incomplete(&id).await?;
            println!("{}", task_line(&task));
            Ok(())
        }

        TasksCommand::Toggle { id } => {
            require_session(client)?;
            match client.tasks.toggle_complete_async(&id).await? {
                Some(task) => println!("{}", task_line(&task)),
                None => bail!("no cached task with id {id} (run: tasky tasks sync)"),
            }
            Ok(())
        }

        TasksCommand::Delete { id } => {
            require_session(client)?;
            client.tasks.delete_task_async(&id).await?;
            println!("Deleted {id}.");
            Ok(())
        }

        TasksCommand::Restore { id } => {
            require_session(client)?;
            let task = client.tasks.restore_task_async(&id).await?;
            println!("Restored {}", task_line(&task));
            Ok(())
        }

        TasksCommand::Remote { status } => {
            require_session(client)?;
            let tasks = client.api.list_tasks_by_status(status).await?;
            println!("{} ({})", status.as_str(), tasks.len());
            for t in &tasks {
                println!("  {}", task_line(t));
            }
            Ok(())
        }
    }
}

async fn list(
    client: &TaskyClient,
    cfg: &Config,
    view: View,
    criteria: &FilterCriteria,
    offline: bool,
) -> Result<()> {
    if !offline && client.is_authenticated() {
        match client.tasks.fetch_tasks().await {
            Ok(tasks) => debug!(count = tasks.len(), "refreshed task list"),
            Err(e) if e.is_unauthorized() => return Err(e.into()),
            Err(e) => eprintln!("warning: could not refresh ({e}); showing cached tasks"),
        }
    }

    if !criteria.is_empty() && !view.honors_filters() {
        eprintln!("note: filters do not apply to the {} view", view.label());
    }
    let visible = client.tasks.view(view, criteria, today(cfg)?);
    print_view(view, &visible);
    Ok(())
}
