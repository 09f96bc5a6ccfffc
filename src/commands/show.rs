//! Show command for displaying full task details
//!
//! Implements the `tm show` command.

use super::{CliError, Context};
use crate::output::format_task_detail;
use clap::Args;
use taskmate_db::TaskJson;

/// Show full details of a task
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Task ID to show
    #[arg(required = true)]
    pub id: String,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

impl ShowCommand {
    /// Execute the show command.
    ///
    /// # Errors
    ///
    /// Returns `CliError` if:
    /// - Login fails
    /// - The task does not exist or belongs to someone else
    pub async fn execute(&self, ctx: &Context) -> Result<String, CliError> {
        let user = ctx.login().await?;
        let task = ctx.db.tasks(&user.id).get(self.id.trim()).await?;

        if self.json {
            Ok(serde_json::to_string_pretty(&TaskJson::from(&task))?)
        } else {
            Ok(format_task_detail(&task, ctx.today()))
        }
    }
}
