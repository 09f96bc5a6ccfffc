//! Database module for taskmate
//!
//! Provides SurrealDB connection management with an embedded RocksDB
//! backend (or an in-memory engine), schema initialization, user accounts,
//! and owner-scoped task storage with filtering.

pub mod clock;
pub mod error;
pub mod id;
pub mod models;
pub mod password;
pub mod repository;
pub mod schema;
pub mod values;

pub use clock::{ParseTimeZoneError, TimeZone};
pub use error::{DbError, DbResult, FieldErrors};
pub use id::IdGenerator;
pub use models::{NewTask, Task, TaskChanges, TaskJson, User, UserId};
pub use repository::{
    FilterParams, OrderField, OrderKey, Predicate, TaskFilter, TaskOrdering, TaskRepository,
    TaskStats, UserRepository, apply_ordering, build_predicate,
};
pub use values::{DATE_FORMAT, parse_bool, parse_checkbox, parse_date};

use std::path::{Path, PathBuf};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem, RocksDb};
use tracing::debug;

/// Default database directory, relative to the user's home directory
pub const DEFAULT_DB_DIR: &str = ".taskmate/data";

const NAMESPACE: &str = "taskmate";
const DATABASE: &str = "main";

/// Database wrapper providing connection management for SurrealDB
///
/// The client is private: task records are only reachable through
/// [`Database::tasks`], which scopes every query to one owner.
///
/// ```compile_fail
/// async fn raw(db: &taskmate_db::Database) {
///     let _ = db.client();
/// }
/// ```
pub struct Database {
    /// The underlying SurrealDB client
    client: Surreal<Db>,
    /// Directory holding the RocksDB files, `None` for in-memory databases
    path: Option<PathBuf>,
}

impl Database {
    /// Connect to a SurrealDB database at the specified path.
    ///
    /// Creates the database directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `DbError::CreateDirectory` if directory creation fails.
    /// Returns `DbError::Connection` if database connection fails.
    pub async fn connect(path: &Path) -> DbResult<Self> {
        let path = Self::prepare_path(path)?;
        debug!("Opening database at {}", path.display());

        let client =
            Surreal::new::<RocksDb>(path.clone())
                .await
                .map_err(|e| DbError::Connection {
                    path: path.clone(),
                    source: Box::new(e),
                })?;

        Ok(Self {
            client,
            path: Some(path),
        })
    }

    /// Open a fresh in-memory database. Nothing is persisted.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Connection` if the engine cannot start.
    pub async fn connect_in_memory() -> DbResult<Self> {
        let client = Surreal::new::<Mem>(())
            .await
            .map_err(|e| DbError::Connection {
                path: PathBuf::from(":memory:"),
                source: Box::new(e),
            })?;
        Ok(Self { client, path: None })
    }

    /// Initialize the database schema.
    ///
    /// Selects the taskmate namespace and database, then defines the user
    /// and task tables.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Schema` if schema initialization fails.
    pub async fn init(&self) -> DbResult<()> {
        self.client
            .use_ns(NAMESPACE)
            .use_db(DATABASE)
            .await
            .map_err(|e| DbError::Schema(Box::new(e)))?;

        schema::init_schema(&self.client).await?;

        Ok(())
    }

    /// Get the path where the database is stored, if on disk.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Task operations scoped to `owner`
    pub fn tasks(&self, owner: &UserId) -> TaskRepository<'_> {
        TaskRepository::new(&self.client, owner.clone())
    }

    /// User account operations
    pub fn users(&self) -> UserRepository<'_> {
        UserRepository::new(&self.client)
    }

    /// Prepare the database path by creating missing directories.
    fn prepare_path(path: &Path) -> DbResult<PathBuf> {
        let path = path.to_path_buf();

        if !path.exists() {
            std::fs::create_dir_all(&path).map_err(|e| DbError::CreateDirectory {
                path: path.clone(),
                source: e,
            })?;
        }

        Ok(path)
    }
}

// Ensure Database is Send + Sync so it can be shared across request handlers
static_assertions::assert_impl_all!(Database: Send, Sync);

/// Test utilities for creating isolated test databases
#[cfg(test)]
pub mod test_utils {
    use super::*;

    /// Password used for every user created by [`create_user_in_db`]
    pub const TEST_PASSWORD: &str = "test-password";

    /// Create an isolated, initialized in-memory database.
    ///
    /// Each call creates a new independent database, so tests can run
    /// concurrently without interference.
    pub async fn create_test_db() -> DbResult<Database> {
        let db = Database::connect_in_memory().await?;
        db.init().await?;
        Ok(db)
    }

    /// Register a user with [`TEST_PASSWORD`] and return its identity
    pub async fn create_user_in_db(db: &Database, username: &str) -> DbResult<UserId> {
        let user = db.users().register(username, None, TEST_PASSWORD).await?;
        Ok(user.id)
    }
}
