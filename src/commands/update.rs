//! Update command for modifying existing tasks
//!
//! Implements the `tm update` command. Only the given fields change.

use super::{CliError, Context, date_arg};
use chrono::NaiveDate;
use clap::Args;
use clap::builder::BoolishValueParser;
use taskmate_db::TaskChanges;

/// Update an existing task
#[derive(Debug, Args)]
pub struct UpdateCommand {
    /// Task ID to update
    #[arg(required = true)]
    pub id: String,

    /// New title
    #[arg(long)]
    pub title: Option<String>,

    /// New description
    #[arg(short, long)]
    pub description: Option<String>,

    /// New due date (YYYY-MM-DD)
    #[arg(long, value_parser = date_arg)]
    pub due: Option<NaiveDate>,

    /// Mark completed or not (true/false, yes/no, 1/0, on/off)
    #[arg(long, value_parser = BoolishValueParser::new())]
    pub completed: Option<bool>,
}

impl UpdateCommand {
    fn changes(&self) -> TaskChanges {
        TaskChanges {
            title: self.title.clone(),
            description: self.description.clone(),
            due_date: self.due,
            completed: self.completed,
        }
    }

    /// Execute the update command.
    ///
    /// # Errors
    ///
    /// Returns `CliError` if:
    /// - Login fails
    /// - The task does not exist or belongs to someone else
    /// - The new title is blank
    pub async fn execute(&self, ctx: &Context) -> Result<String, CliError> {
        let user = ctx.login().await?;
        let id = self.id.trim();
        let changes = self.changes();
        let tasks = ctx.db.tasks(&user.id);

        if !changes.has_changes() {
            tasks.get(id).await?;
            return Ok(format!("No changes specified for task: {}", id));
        }

        let task = tasks.update(id, &changes).await?;
        Ok(format!("Updated task: {}", task.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_utils::{logged_in, second_user};
    use taskmate_db::{DbError, NewTask, Task};

    async fn add(ctx: &Context, title: &str) -> Task {
        let user = ctx.login().await.unwrap();
        ctx.db
            .tasks(&user.id)
            .create(&NewTask::new(title, ctx.today()).with_description("original"))
            .await
            .unwrap()
    }

    fn update(id: &str) -> UpdateCommand {
        UpdateCommand {
            id: id.to_string(),
            title: None,
            description: None,
            due: None,
            completed: None,
        }
    }

    #[tokio::test]
    async fn test_update_changes_only_given_fields() {
        let ctx = logged_in("alice").await;
        let task = add(&ctx, "Old").await;
        let mut cmd = update(&task.id);
        cmd.title = Some("New".to_string());
        cmd.completed = Some(true);

        let output = cmd.execute(&ctx).await.unwrap();

        assert_eq!(output, format!("Updated task: {}", task.id));
        let user = ctx.login().await.unwrap();
        let stored = ctx.db.tasks(&user.id).get(&task.id).await.unwrap();
        assert_eq!(stored.title, "New");
        assert!(stored.completed);
        assert_eq!(stored.description, "original");
        assert_eq!(stored.due_date, task.due_date);
        assert_eq!(stored.created_at, task.created_at);
    }

    #[tokio::test]
    async fn test_update_without_changes() {
        let ctx = logged_in("alice").await;
        let task = add(&ctx, "Same").await;

        let output = update(&task.id).execute(&ctx).await.unwrap();

        assert!(output.starts_with("No changes specified"));
    }

    #[tokio::test]
    async fn test_update_foreign_task_is_not_found() {
        let alice = logged_in("alice").await;
        let bob = second_user(&alice, "bob").await;
        let task = add(&alice, "Private").await;

        let mut cmd = update(&task.id);
        cmd.title = Some("Hijacked".to_string());
        let result = cmd.execute(&bob).await;

        assert!(matches!(
            result,
            Err(CliError::Db(DbError::NotFound { .. }))
        ));
        let user = alice.login().await.unwrap();
        let stored = alice.db.tasks(&user.id).get(&task.id).await.unwrap();
        assert_eq!(stored.title, "Private");
    }

    #[tokio::test]
    async fn test_update_rejects_blank_title() {
        let ctx = logged_in("alice").await;
        let task = add(&ctx, "Titled").await;
        let mut cmd = update(&task.id);
        cmd.title = Some(" ".to_string());

        let result = cmd.execute(&ctx).await;

        assert!(matches!(result, Err(CliError::Db(DbError::Validation(_)))));
    }
}
