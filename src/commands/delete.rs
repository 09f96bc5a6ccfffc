//! Delete command for removing tasks
//!
//! Implements the `tm delete` command.

use super::{CliError, Context};
use clap::Args;

/// Delete a task
#[derive(Debug, Args)]
pub struct DeleteCommand {
    /// Task ID to delete
    #[arg(required = true)]
    pub id: String,
}

impl DeleteCommand {
    /// Execute the delete command.
    ///
    /// # Errors
    ///
    /// Returns `CliError` if:
    /// - Login fails
    /// - The task does not exist or belongs to someone else
    pub async fn execute(&self, ctx: &Context) -> Result<String, CliError> {
        let user = ctx.login().await?;
        let id = self.id.trim();

        ctx.db.tasks(&user.id).delete(id).await?;

        Ok(format!("Deleted task: {}", id))
    }
}
