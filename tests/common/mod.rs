//! Test infrastructure for CLI integration tests
//!
//! Provides isolated database setup/teardown and command helpers.
//! Each test gets its own on-disk database to ensure no shared state.
#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use taskmate::commands::{
    AddCommand, CliError, Context, Credentials, ListCommand, RegisterCommand,
};
use taskmate_db::{Database, TimeZone};

pub const PASSWORD: &str = "workflow-pass-1";

/// Test context containing an isolated database and its temp directory
pub struct TestContext {
    pub db: Arc<Database>,
    pub temp_dir: PathBuf,
}

impl TestContext {
    /// Create a new test context with an isolated database.
    ///
    /// Each call creates a uniquely named temp directory using process ID,
    /// thread ID, and nanosecond timestamp to guarantee isolation.
    pub async fn new() -> Self {
        let temp_dir = std::env::temp_dir().join(format!(
            "tm-integration-test-{}-{:?}-{}",
            std::process::id(),
            std::thread::current().id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));

        let db = Database::connect(&temp_dir).await.unwrap();
        db.init().await.unwrap();

        Self {
            db: Arc::new(db),
            temp_dir,
        }
    }

    /// Command context acting as `username`
    pub fn as_user(&self, username: &str) -> Context {
        Context::new(
            self.db.clone(),
            Credentials::new(username, PASSWORD),
            TimeZone::Utc,
        )
    }

    /// Register `username` through the register command
    pub async fn register(&self, username: &str) -> Context {
        let ctx = self.as_user(username);
        RegisterCommand {
            username: username.to_string(),
            email: None,
        }
        .execute(&ctx)
        .await
        .unwrap();
        ctx
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.temp_dir);
    }
}

// =============================================================================
// Command Builder Helpers
// =============================================================================

/// Create an AddCommand due `days` from today
pub fn add_cmd(ctx: &Context, title: &str, days: i64) -> AddCommand {
    AddCommand {
        title: title.to_string(),
        due: ctx.today() + chrono::Duration::days(days),
        description: None,
        completed: false,
    }
}

/// A ListCommand with no filters and JSON output
pub fn list_cmd() -> ListCommand {
    ListCommand {
        search: None,
        completed: None,
        due_from: None,
        due_to: None,
        overdue: false,
        ordering: None,
        json: true,
    }
}

/// Run `add` and return the new task's id
pub async fn add_task(ctx: &Context, title: &str, days: i64) -> Result<String, CliError> {
    let output = add_cmd(ctx, title, days).execute(ctx).await?;
    Ok(output.trim_start_matches("Created task: ").to_string())
}

/// Run `list` and return the titles in order
pub async fn list_titles(ctx: &Context, cmd: &ListCommand) -> Vec<String> {
    let output = cmd.execute(ctx).await.unwrap();
    let tasks: Vec<taskmate_db::TaskJson> = serde_json::from_str(&output).unwrap();
    tasks.into_iter().map(|t| t.title).collect()
}
