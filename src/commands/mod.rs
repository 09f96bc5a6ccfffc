//! CLI commands for taskmate
//!
//! This module contains all subcommand implementations for the tm CLI.
//! Every command returns the text to print; task commands log in with the
//! global `--user` / `--password` first and only ever see that user's tasks.

pub mod add;
pub mod delete;
pub mod list;
pub mod register;
pub mod serve;
pub mod show;
pub mod stats;
pub mod update;

pub use add::AddCommand;
pub use delete::DeleteCommand;
pub use list::ListCommand;
pub use register::RegisterCommand;
pub use serve::ServeCommand;
pub use show::ShowCommand;
pub use stats::StatsCommand;
pub use update::UpdateCommand;

use chrono::NaiveDate;
use clap::Subcommand;
use std::sync::Arc;
use taskmate_db::{Database, DbError, TimeZone, User};
use thiserror::Error;

/// Errors surfaced by CLI commands
#[derive(Error, Debug)]
pub enum CliError {
    /// Any store-level failure
    #[error(transparent)]
    Db(#[from] DbError),

    /// A command that needs a login ran without credentials
    #[error("This command requires --user and --password (or TASKMATE_USER and TASKMATE_PASSWORD)")]
    MissingCredentials,

    /// The home directory could not be determined for the default database path
    #[error("Could not determine home directory")]
    NoHomeDirectory,

    /// JSON output could not be produced
    #[error("Failed to encode output: {0}")]
    Json(#[from] serde_json::Error),

    /// The web server failed to start or stopped with an error
    #[error("Web server failed: {0:#}")]
    Server(anyhow::Error),
}

impl CliError {
    /// Get the full error message, including nested store details.
    pub fn full_message(&self) -> String {
        match self {
            CliError::Db(e) => e.full_message(),
            other => other.to_string(),
        }
    }
}

/// Login details given on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
        }
    }
}

/// Everything a command needs to run
pub struct Context {
    pub db: Arc<Database>,
    pub credentials: Credentials,
    pub time_zone: TimeZone,
}

impl Context {
    pub fn new(db: Arc<Database>, credentials: Credentials, time_zone: TimeZone) -> Self {
        Self {
            db,
            credentials,
            time_zone,
        }
    }

    /// Authenticate with the configured credentials.
    ///
    /// # Errors
    ///
    /// Returns `CliError::MissingCredentials` if either value is absent and
    /// `DbError::InvalidCredentials` if they do not match an account.
    pub async fn login(&self) -> Result<User, CliError> {
        let (Some(username), Some(password)) = (
            self.credentials.username.as_deref(),
            self.credentials.password.as_deref(),
        ) else {
            return Err(CliError::MissingCredentials);
        };
        let user = self.db.users().authenticate(username, password).await?;
        tracing::debug!("Logged in as {}", user.username);
        Ok(user)
    }

    /// The evaluation date for overdue checks
    pub fn today(&self) -> NaiveDate {
        self.time_zone.today()
    }
}

/// Available CLI commands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create an account
    Register(RegisterCommand),
    /// Create a new task
    Add(AddCommand),
    /// List tasks with optional filtering and ordering
    List(ListCommand),
    /// Show full details of a task
    Show(ShowCommand),
    /// Update a task
    Update(UpdateCommand),
    /// Delete a task
    Delete(DeleteCommand),
    /// Show task counts
    Stats(StatsCommand),
    /// Run the web server
    Serve(ServeCommand),
}

impl Command {
    /// Execute the command.
    ///
    /// # Errors
    ///
    /// Returns `CliError` if the command execution fails.
    pub async fn execute(&self, ctx: &Context) -> Result<String, CliError> {
        match self {
            Command::Register(cmd) => cmd.execute(ctx).await,
            Command::Add(cmd) => cmd.execute(ctx).await,
            Command::List(cmd) => cmd.execute(ctx).await,
            Command::Show(cmd) => cmd.execute(ctx).await,
            Command::Update(cmd) => cmd.execute(ctx).await,
            Command::Delete(cmd) => cmd.execute(ctx).await,
            Command::Stats(cmd) => cmd.execute(ctx).await,
            Command::Serve(cmd) => cmd.execute(ctx).await,
        }
    }
}

/// Parse a `YYYY-MM-DD` command-line date
pub(crate) fn date_arg(s: &str) -> Result<NaiveDate, String> {
    taskmate_db::parse_date(s)
        .ok_or_else(|| format!("'{}' is not a valid date (expected YYYY-MM-DD)", s))
}
