//! User accounts: registration, credential checks and lookup

use crate::error::{DbError, DbResult, FieldErrors};
use crate::id::IdGenerator;
use crate::models::{User, UserId};
use crate::password::{hash_password, verify_password};
use serde::Deserialize;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use tracing::{debug, trace, warn};

/// Longest accepted username
pub const MAX_USERNAME_LENGTH: usize = 150;

/// Shortest accepted password
pub const MIN_PASSWORD_LENGTH: usize = 8;

const MAX_ID_ATTEMPTS: usize = 10;

/// Name of the unique index on `user.username`
const USERNAME_INDEX: &str = "user_username";

/// Row shape of the `user` table
#[derive(Debug, Deserialize)]
struct UserRow {
    id: surrealdb::sql::Thing,
    username: String,
    email: Option<String>,
    password_hash: String,
    created_at: surrealdb::sql::Datetime,
}

impl UserRow {
    fn into_user(self) -> User {
        User {
            id: UserId::new(self.id.id.to_string()),
            username: self.username,
            email: self.email,
            created_at: self.created_at.0,
        }
    }
}

/// Repository for user accounts
pub struct UserRepository<'a> {
    client: &'a Surreal<Db>,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository with the given database client
    pub fn new(client: &'a Surreal<Db>) -> Self {
        Self { client }
    }

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Validation` for a malformed username, email or
    /// password (all fields are checked before returning).
    /// Returns `DbError::UsernameTaken` if the username is in use.
    /// Returns `DbError::Query` if the database operation fails.
    pub async fn register(
        &self,
        username: &str,
        email: Option<&str>,
        password: &str,
    ) -> DbResult<User> {
        let username = username.trim();
        let email = email.map(str::trim).filter(|e| !e.is_empty());

        let mut errors = FieldErrors::new();
        validate_username(username, &mut errors);
        if let Some(email) = email {
            validate_email(email, &mut errors);
        }
        validate_password(password, &mut errors);
        errors.into_result()?;

        if self.find_row(username).await?.is_some() {
            debug!("Registration rejected, username taken: {}", username);
            return Err(DbError::UsernameTaken {
                username: username.to_string(),
            });
        }

        let password_hash = hash_password(password)?;
        let id = self.unused_id().await?;
        debug!("Registering user: {} as {}", username, id);

        let mut fields = vec!["username = $username", "password_hash = $password_hash"];
        if email.is_some() {
            fields.push("email = $email");
        }
        let query = format!("CREATE type::thing('user', $id) SET {}", fields.join(", "));

        let mut result = self
            .client
            .query(&query)
            .bind(("id", id.clone()))
            .bind(("username", username.to_string()))
            .bind(("email", email.unwrap_or_default().to_string()))
            .bind(("password_hash", password_hash))
            .await?
            .check()
            .map_err(|e| create_error(e, username))?;
        let row: Option<UserRow> = result.take(0)?;
        row.map(UserRow::into_user)
            .ok_or_else(|| DbError::InvalidRecord {
                table: "user",
                id,
                reason: "record missing after create".to_string(),
            })
    }

    /// Check a username/password pair.
    ///
    /// # Errors
    ///
    /// Returns `DbError::InvalidCredentials` if the user is unknown or the
    /// password does not match. The two cases are indistinguishable.
    pub async fn authenticate(&self, username: &str, password: &str) -> DbResult<User> {
        let Some(row) = self.find_row(username.trim()).await? else {
            debug!("Authentication failed, unknown user: {}", username);
            return Err(DbError::InvalidCredentials);
        };
        if !verify_password(password, &row.password_hash) {
            warn!("Authentication failed for user: {}", row.username);
            return Err(DbError::InvalidCredentials);
        }
        trace!("Authenticated user: {}", row.username);
        Ok(row.into_user())
    }

    /// Look up a user by identity.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Query` if the database operation fails.
    pub async fn get(&self, id: &UserId) -> DbResult<Option<User>> {
        let row: Option<UserRow> = self
            .client
            .select(("user", id.as_str()))
            .await
            .map_err(|e| DbError::Query(Box::new(e)))?;
        Ok(row.map(UserRow::into_user))
    }

    /// Look up a user by username.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Query` if the database operation fails.
    pub async fn find_by_username(&self, username: &str) -> DbResult<Option<User>> {
        Ok(self.find_row(username).await?.map(UserRow::into_user))
    }

    async fn find_row(&self, username: &str) -> DbResult<Option<UserRow>> {
        let mut result = self
            .client
            .query("SELECT * FROM user WHERE username = $username LIMIT 1")
            .bind(("username", username.to_string()))
            .await?
            .check()?;
        Ok(result.take(0)?)
    }

    async fn unused_id(&self) -> DbResult<String> {
        let ids = IdGenerator::default();
        for _ in 0..MAX_ID_ATTEMPTS {
            let id = ids.generate();
            if self.get(&UserId::new(id.clone())).await?.is_none() {
                return Ok(id);
            }
        }
        Err(DbError::IdGeneration {
            table: "user",
            attempts: MAX_ID_ATTEMPTS,
        })
    }
}

/// A concurrent registration can pass the lookup above and still lose the
/// race on the unique username index.
fn create_error(err: surrealdb::Error, username: &str) -> DbError {
    match err {
        surrealdb::Error::Db(surrealdb::error::Db::IndexExists { ref index, .. })
            if index == USERNAME_INDEX =>
        {
            debug!("Registration lost race on username: {}", username);
            DbError::UsernameTaken {
                username: username.to_string(),
            }
        }
        other => DbError::Query(Box::new(other)),
    }
}

fn validate_username(username: &str, errors: &mut FieldErrors) {
    if username.is_empty() {
        errors.add("username", "This field may not be blank.");
        return;
    }
    if username.chars().count() > MAX_USERNAME_LENGTH {
        errors.add(
            "username",
            format!("Ensure this field has no more than {MAX_USERNAME_LENGTH} characters."),
        );
    }
    let allowed = |c: char| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_');
    if !username.chars().all(allowed) {
        errors.add(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        );
    }
}

fn validate_email(email: &str, errors: &mut FieldErrors) {
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        })
        && !email.chars().any(char::is_whitespace);
    if !valid {
        errors.add("email", "Enter a valid email address.");
    }
}

fn validate_password(password: &str, errors: &mut FieldErrors) {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.add(
            "password",
            format!(
                "This password is too short. It must contain at least {MIN_PASSWORD_LENGTH} characters."
            ),
        );
    }
    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        errors.add("password", "This password is entirely numeric.");
    }
}
