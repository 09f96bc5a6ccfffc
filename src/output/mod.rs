//! Output formatting module for taskmate
//!
//! Provides table formatting and display utilities for CLI output.

use chrono::NaiveDate;
use taskmate_db::{Task, TaskStats};

/// Maximum width for the title column before truncation
const MAX_TITLE_WIDTH: usize = 40;

/// Truncate a string to the specified maximum width (in characters),
/// adding an ellipsis if needed.
fn truncate(s: &str, max_width: usize) -> String {
    if s.chars().count() <= max_width {
        s.to_string()
    } else if max_width <= 3 {
        s.chars().take(max_width).collect()
    } else {
        let kept: String = s.chars().take(max_width - 3).collect();
        format!("{}...", kept)
    }
}

/// Status label for a task as of `today`
fn status(task: &Task, today: NaiveDate) -> &'static str {
    if task.completed {
        "done"
    } else if task.is_overdue(today) {
        "overdue"
    } else {
        "open"
    }
}

/// Format tasks into an aligned table string.
///
/// Produces output in the format:
/// ```text
/// ID          Due         Status   Title
/// ----------  ----------  -------  ----------------
/// k3x9q2m7ta  2026-05-19  overdue  Renew passport
/// ```
pub fn format_task_table(tasks: &[Task], today: NaiveDate) -> String {
    if tasks.is_empty() {
        return "No tasks found.".to_string();
    }

    let headers = ["ID", "Due", "Status", "Title"];

    let id_width = tasks
        .iter()
        .map(|t| t.id.len())
        .max()
        .unwrap_or(0)
        .max(headers[0].len());
    // YYYY-MM-DD
    let due_width = 10;
    let status_width = "overdue".len();
    let title_width = tasks
        .iter()
        .map(|t| t.title.chars().count().min(MAX_TITLE_WIDTH))
        .max()
        .unwrap_or(0)
        .max(headers[3].len());

    let mut output = String::new();

    output.push_str(&format!(
        "{:<id_w$}  {:<due_w$}  {:<status_w$}  {}\n",
        headers[0],
        headers[1],
        headers[2],
        headers[3],
        id_w = id_width,
        due_w = due_width,
        status_w = status_width,
    ));

    output.push_str(&format!(
        "{:->id_w$}  {:->due_w$}  {:->status_w$}  {:->title_w$}\n",
        "",
        "",
        "",
        "",
        id_w = id_width,
        due_w = due_width,
        status_w = status_width,
        title_w = title_width,
    ));

    for task in tasks {
        output.push_str(&format!(
            "{:<id_w$}  {:<due_w$}  {:<status_w$}  {}\n",
            task.id,
            task.due_date.to_string(),
            status(task, today),
            truncate(&task.title, MAX_TITLE_WIDTH),
            id_w = id_width,
            due_w = due_width,
            status_w = status_width,
        ));
    }

    // Remove trailing newline
    output.pop();

    output
}

/// Format one task with every field
pub fn format_task_detail(task: &Task, today: NaiveDate) -> String {
    let description = if task.description.is_empty() {
        "-"
    } else {
        task.description.as_str()
    };

    format!(
        "ID:          {}\nTitle:       {}\nDue:         {}\nStatus:      {}\nCreated:     {}\nDescription: {}",
        task.id,
        task.title,
        task.due_date,
        status(task, today),
        task.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
        description,
    )
}

pub fn format_stats(stats: &TaskStats) -> String {
    format!(
        "Total:      {}\nCompleted:  {}\nIncomplete: {}\nOverdue:    {}",
        stats.total, stats.completed, stats.incomplete, stats.overdue
    )
}
