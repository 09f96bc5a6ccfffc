//! Add command for creating new tasks
//!
//! Implements the `tm add` command.

use super::{CliError, Context, date_arg};
use chrono::NaiveDate;
use clap::Args;
use taskmate_db::NewTask;

/// Create a new task
#[derive(Debug, Args)]
pub struct AddCommand {
    /// Title of the task
    #[arg(required = true)]
    pub title: String,

    /// Due date (YYYY-MM-DD)
    #[arg(long, value_parser = date_arg)]
    pub due: NaiveDate,

    /// Detailed description
    #[arg(short, long)]
    pub description: Option<String>,

    /// Create the task already completed
    #[arg(long)]
    pub completed: bool,
}

impl AddCommand {
    /// Execute the add command.
    ///
    /// Creates a task owned by the logged-in user.
    ///
    /// # Errors
    ///
    /// Returns `CliError` if:
    /// - Login fails
    /// - The title is blank
    /// - The database operation fails
    pub async fn execute(&self, ctx: &Context) -> Result<String, CliError> {
        let user = ctx.login().await?;

        let new = NewTask::new(self.title.clone(), self.due)
            .with_description(self.description.clone().unwrap_or_default())
            .with_completed(self.completed);
        let task = ctx.db.tasks(&user.id).create(&new).await?;

        Ok(format!("Created task: {}", task.id))
    }
}
