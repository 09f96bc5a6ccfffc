//! Stats command for summary counts
//!
//! Implements the `tm stats` command. Counts always cover every task of the
//! logged-in user.

use super::{CliError, Context};
use crate::output::format_stats;
use clap::Args;

/// Show task counts
#[derive(Debug, Args)]
pub struct StatsCommand {
    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    /// Execute the stats command.
    ///
    /// # Errors
    ///
    /// Returns `CliError` if login or the database query fails.
    pub async fn execute(&self, ctx: &Context) -> Result<String, CliError> {
        let user = ctx.login().await?;
        let stats = ctx.db.tasks(&user.id).stats(ctx.today()).await?;

        if self.json {
            Ok(serde_json::to_string_pretty(&stats)?)
        } else {
            Ok(format_stats(&stats))
        }
    }
}
