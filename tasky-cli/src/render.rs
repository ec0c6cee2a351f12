use tasky_core::{Task, User, View};

/// Headline and hint printed when a view has nothing to show.
pub fn empty_message(view: View) -> (&'static str, &'static str) {
    match view {
        View::MyTasks => ("No tasks yet", "Add one with `tasky tasks add <title>`."),
        View::Inbox => ("Inbox is empty", "Everything you add lands here first."),
        View::Today => ("Nothing due today", "Enjoy the free time, or plan ahead."),
        View::Upcoming => ("Nothing coming up", "No open tasks are due in the next 7 days."),
        View::Completed => ("No completed tasks", "Finished tasks show up here."),
        View::Trash => ("Trash is empty", "Deleted tasks are kept here and deleted after 30 days."),
    }
}

pub fn task_line(task: &Task) -> String {
    let check = if task.is_completed { "[x]" } else { "[ ]" };
    let mut line = format!("{check} {:<12} {}", task.id, task.title);

    let mut meta = vec![task.priority.to_string()];
    if let Some(due) = task.due_date {
        meta.push(format!("due {due}"));
    }
    if let Some(project) = task.project.as_deref().filter(|p| !p.trim().is_empty()) {
        meta.push(format!("@{project}"));
    }
    meta.extend(task.labels.iter().map(|l| format!("#{l}")));
    line.push_str(&format!("  ({})", meta.join(", ")));
    line
}

pub fn print_view(view: View, tasks: &[Task]) {
    println!("{} ({})", view.label(), tasks.len());
    if tasks.is_empty() {
        let (headline, hint) = empty_message(view);
        println!("  {headline}");
        println!("  {hint}");
        return;
    }
    for t in tasks {
        println!("  {}", task_line(t));
        if let Some(desc) = t.description.as_deref().filter(|d| !d.trim().is_empty()) {
            println!("      {desc}");
        }
    }
}

pub fn print_user(user: &User) {
    println!("{}", user.display_name());
    println!("  username: {}", user.user_name);
    println!("  email:    {}", user.email_address);
    if let Some(pic) = &user.profile_picture {
        println!("  picture:  {pic}");
    }
}
