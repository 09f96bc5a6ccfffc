//! List command for displaying tasks
//!
//! Implements the `tm list` command. Filter values go through the same
//! parsing as the web query string, so the accepted spellings match.

use super::{CliError, Context};
use crate::output::format_task_table;
use clap::Args;
use taskmate_db::{FilterParams, TaskJson};

/// List tasks with optional filtering and ordering
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Case-insensitive text to find in the title or description
    #[arg(short, long)]
    pub search: Option<String>,

    /// Completion status (true/false, yes/no, 1/0, on/off)
    #[arg(long)]
    pub completed: Option<String>,

    /// Only tasks due on or after this date (YYYY-MM-DD)
    #[arg(long = "due-from")]
    pub due_from: Option<String>,

    /// Only tasks due on or before this date (YYYY-MM-DD)
    #[arg(long = "due-to")]
    pub due_to: Option<String>,

    /// Only open tasks due before today
    #[arg(long)]
    pub overdue: bool,

    /// Comma-separated keys (due_date, title, created_at), `-` for descending
    #[arg(short, long, allow_hyphen_values = true)]
    pub ordering: Option<String>,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

impl ListCommand {
    fn params(&self) -> FilterParams {
        FilterParams {
            search: self.search.clone(),
            completed: self.completed.clone(),
            due_date_from: self.due_from.clone(),
            due_date_to: self.due_to.clone(),
            overdue: self.overdue.then(|| "true".to_string()),
            ordering: self.ordering.clone(),
        }
    }

    /// Execute the list command.
    ///
    /// # Errors
    ///
    /// Returns `CliError` if:
    /// - Login fails
    /// - A filter value is malformed
    /// - The database query fails
    pub async fn execute(&self, ctx: &Context) -> Result<String, CliError> {
        let user = ctx.login().await?;
        let filter = self.params().parse()?;
        let today = ctx.today();

        let tasks = ctx.db.tasks(&user.id).list(&filter, today).await?;

        if self.json {
            let tasks: Vec<TaskJson> = tasks.iter().map(TaskJson::from).collect();
            Ok(serde_json::to_string_pretty(&tasks)?)
        } else {
            Ok(format_task_table(&tasks, today))
        }
    }
}
