//! Database schema initialization for taskmate
//!
//! Defines the SurrealDB schema for user accounts and their tasks.

use crate::error::DbError;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

/// SQL statements for schema initialization
mod sql {
    /// Define the user table with a unique username index
    pub const DEFINE_USER_TABLE: &str = r#"
        DEFINE TABLE IF NOT EXISTS user SCHEMAFULL;

        DEFINE FIELD IF NOT EXISTS username ON user TYPE string;

        DEFINE FIELD IF NOT EXISTS email ON user TYPE option<string>;

        DEFINE FIELD IF NOT EXISTS password_hash ON user TYPE string;

        DEFINE FIELD IF NOT EXISTS created_at ON user TYPE datetime DEFAULT time::now();

        DEFINE INDEX IF NOT EXISTS user_username ON user FIELDS username UNIQUE;
    "#;

    /// Define the task table. `due_date` holds an ISO calendar date string,
    /// which compares correctly as text.
    pub const DEFINE_TASK_TABLE: &str = r#"
        DEFINE TABLE IF NOT EXISTS task SCHEMAFULL;

        DEFINE FIELD IF NOT EXISTS title ON task TYPE string;

        DEFINE FIELD IF NOT EXISTS description ON task TYPE string DEFAULT "";

        DEFINE FIELD IF NOT EXISTS due_date ON task TYPE string;

        DEFINE FIELD IF NOT EXISTS completed ON task TYPE bool DEFAULT false;

        DEFINE FIELD IF NOT EXISTS created_at ON task TYPE datetime DEFAULT time::now() READONLY;

        DEFINE FIELD IF NOT EXISTS owner ON task TYPE record<user> READONLY;

        DEFINE INDEX IF NOT EXISTS task_owner ON task FIELDS owner;
    "#;
}

/// Initialize the database schema.
///
/// Creates the user and task tables with all required fields and indexes.
///
/// This function is idempotent - it can be called multiple times safely
/// as it uses `IF NOT EXISTS` clauses.
///
/// # Errors
///
/// Returns `DbError::Schema` if any schema definition fails.
pub async fn init_schema(client: &Surreal<Db>) -> Result<(), DbError> {
    for statements in [sql::DEFINE_USER_TABLE, sql::DEFINE_TASK_TABLE] {
        client
            .query(statements)
            .await
            .and_then(|response| response.check())
            .map_err(|e| DbError::Schema(Box::new(e)))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use surrealdb::engine::local::Mem;

    async fn setup_client() -> Surreal<Db> {
        let client = Surreal::new::<Mem>(()).await.unwrap();
        client.use_ns("taskmate").use_db("test").await.unwrap();
        client
    }

    #[tokio::test]
    async fn test_init_schema_succeeds() {
        let client = setup_client().await;
        let result = init_schema(&client).await;
        assert!(result.is_ok(), "Schema init failed: {:?}", result.err());
    }

    #[tokio::test]
    async fn test_init_schema_is_idempotent() {
        let client = setup_client().await;

        let result1 = init_schema(&client).await;
        assert!(result1.is_ok(), "First init failed: {:?}", result1.err());

        let result2 = init_schema(&client).await;
        assert!(result2.is_ok(), "Second init failed: {:?}", result2.err());
    }

    #[tokio::test]
    async fn test_task_completed_defaults_to_false() {
        let client = setup_client().await;
        init_schema(&client).await.unwrap();

        client
            .query(r#"CREATE user:u1 SET username = "u1", password_hash = "x""#)
            .await
            .unwrap()
            .check()
            .unwrap();
        let mut result = client
            .query(
                r#"CREATE task:t1 SET title = "T", due_date = "2026-01-01", owner = user:u1;
                   SELECT VALUE completed FROM task:t1"#,
            )
            .await
            .unwrap();
        let completed: Option<bool> = result.take(1).unwrap();
        assert_eq!(completed, Some(false));
    }

    #[tokio::test]
    async fn test_duplicate_username_is_rejected() {
        let client = setup_client().await;
        init_schema(&client).await.unwrap();

        client
            .query(r#"CREATE user:a SET username = "same", password_hash = "x""#)
            .await
            .unwrap()
            .check()
            .unwrap();
        let second = client
            .query(r#"CREATE user:b SET username = "same", password_hash = "x""#)
            .await
            .unwrap()
            .check();
        assert!(second.is_err(), "Unique index should reject duplicate username");
    }
}
