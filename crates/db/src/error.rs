use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Validation messages keyed by the name of the offending field.
///
/// Messages are collected for every invalid field rather than stopping at
/// the first one, so forms and API clients can report everything at once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    errors: BTreeMap<String, Vec<String>>,
}

impl FieldErrors {
    /// Create an empty error collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message against a field
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    /// Whether no field has an error
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Messages recorded for a field, if any
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.errors.get(field).map(Vec::as_slice)
    }

    /// Messages recorded for a field, empty if none
    pub fn messages(&self, field: &str) -> &[String] {
        self.get(field).unwrap_or_default()
    }

    /// Iterate over `(field, messages)` pairs in field-name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.errors.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Borrow the underlying map (serializes as `{field: [messages]}`)
    pub fn as_map(&self) -> &BTreeMap<String, Vec<String>> {
        &self.errors
    }

    /// Turn the collection into `Err(DbError::Validation)` if anything was recorded
    pub fn into_result(self) -> DbResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(DbError::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.errors {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Database error types for taskmate
#[derive(Error, Debug)]
pub enum DbError {
    /// Error establishing connection to the database
    #[error("Failed to connect to database at {path}: {source}")]
    Connection {
        path: PathBuf,
        #[source]
        source: Box<surrealdb::Error>,
    },

    /// Error during schema initialization
    #[error("Failed to initialize database schema: {0}")]
    Schema(#[source] Box<surrealdb::Error>),

    /// Error executing a query
    #[error("Query execution failed")]
    Query(#[source] Box<surrealdb::Error>),

    /// Error creating database directory
    #[error("Failed to create database directory at {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The task does not exist for the caller. Absent and foreign-owned
    /// tasks both map here.
    #[error("Task '{task_id}' not found")]
    NotFound { task_id: String },

    /// One or more input fields failed validation
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    /// Registration with a username that is already taken
    #[error("A user with username '{username}' already exists")]
    UsernameTaken { username: String },

    /// Unknown username or wrong password
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// A password could not be hashed
    #[error("Failed to hash password: {0}")]
    PasswordHash(#[from] argon2::password_hash::Error),

    /// Every generated record key collided with an existing record
    #[error("Failed to generate a unique {table} id after {attempts} attempts")]
    IdGeneration { table: &'static str, attempts: usize },

    /// A stored record could not be decoded
    #[error("Stored {table} record '{id}' is invalid: {reason}")]
    InvalidRecord {
        table: &'static str,
        id: String,
        reason: String,
    },
}

impl From<surrealdb::Error> for DbError {
    fn from(err: surrealdb::Error) -> Self {
        DbError::Query(Box::new(err))
    }
}

impl DbError {
    /// Build a validation error for a single field
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.add(field, message);
        DbError::Validation(errors)
    }

    /// Get the full error message including nested SurrealDB error details.
    ///
    /// This is useful for displaying detailed error information to users.
    pub fn full_message(&self) -> String {
        match self {
            DbError::Query(err) => format!("Query execution failed: {}", err),
            other => other.to_string(),
        }
    }
}

/// Result type alias for database operations
pub type DbResult<T> = Result<T, DbError>;
