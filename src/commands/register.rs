//! Register command for creating accounts
//!
//! Implements the `tm register` command. The password comes from the global
//! `--password` option (or `TASKMATE_PASSWORD`).

use super::{CliError, Context};
use clap::Args;

/// Create an account
#[derive(Debug, Args)]
pub struct RegisterCommand {
    /// Username for the new account
    #[arg(required = true)]
    pub username: String,

    /// Optional email address
    #[arg(long)]
    pub email: Option<String>,
}

impl RegisterCommand {
    /// Execute the register command.
    ///
    /// # Errors
    ///
    /// Returns `CliError` if:
    /// - No password was given
    /// - A field is invalid or the username is taken
    /// - The database operation fails
    pub async fn execute(&self, ctx: &Context) -> Result<String, CliError> {
        let password = ctx
            .credentials
            .password
            .as_deref()
            .ok_or(CliError::MissingCredentials)?;

        let user = ctx
            .db
            .users()
            .register(&self.username, self.email.as_deref(), password)
            .await?;

        Ok(format!("Registered user: {}", user.username))
    }
}
