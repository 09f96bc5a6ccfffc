//! JSON API over the caller's tasks
//!
//! Request bodies may be JSON objects or urlencoded forms. Every task
//! endpoint runs behind [`crate::auth::require_api_auth_middleware`], so the
//! [`CurrentUser`] extension is always present here.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Extension, Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use taskmate_db::{
    DbError, FieldErrors, FilterParams, NewTask, Task, TaskChanges, TaskJson, TaskStats,
    parse_bool, parse_date,
};

use crate::AppState;
use crate::auth::{CurrentUser, encode_jwt};

const TASKS_PATH: &str = "/api/tasks/";

const REQUIRED: &str = "This field is required.";
const NOT_NULL: &str = "This field may not be null.";
const BAD_DATE: &str = "Date has wrong format. Use one of these formats instead: YYYY-MM-DD.";
const BAD_BOOLEAN: &str = "Must be a valid boolean.";

/// Errors returned by API handlers, rendered as JSON bodies.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not found.")]
    NotFound,
    #[error("Invalid page.")]
    InvalidPage,
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),
    #[error("{0}")]
    BadRequest(String),
    #[error("Unable to log in with provided credentials.")]
    InvalidCredentials,
    #[error("Token signing failed")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("Database error: {0}")]
    Db(DbError),
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { .. } => ApiError::NotFound,
            DbError::Validation(errors) => ApiError::Validation(errors),
            DbError::InvalidCredentials => ApiError::InvalidCredentials,
            other => ApiError::Db(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound | ApiError::InvalidPage => {
                (StatusCode::NOT_FOUND, Json(json!({ "detail": self.to_string() }))).into_response()
            }
            ApiError::Validation(errors) => {
                (StatusCode::BAD_REQUEST, Json(json!(errors.as_map()))).into_response()
            }
            ApiError::BadRequest(detail) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "detail": detail }))).into_response()
            }
            ApiError::InvalidCredentials => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "non_field_errors": [self.to_string()] })),
            )
                .into_response(),
            ApiError::Token(_) | ApiError::Db(_) => {
                tracing::error!("API request failed: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "detail": "A server error occurred." })),
                )
                    .into_response()
            }
        }
    }
}

/// One page of the task list
#[derive(Serialize, Deserialize, Debug)]
pub struct TaskPage {
    pub count: usize,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<TaskJson>,
}

/// Query string of the list endpoint: the filter parameters plus `page`
#[derive(Deserialize, Debug, Default)]
pub struct ListQuery {
    pub search: Option<String>,
    pub completed: Option<String>,
    pub due_date_from: Option<String>,
    pub due_date_to: Option<String>,
    pub overdue: Option<String>,
    pub ordering: Option<String>,
    pub page: Option<String>,
}

impl ListQuery {
    fn filters(&self) -> FilterParams {
        FilterParams {
            search: self.search.clone(),
            completed: self.completed.clone(),
            due_date_from: self.due_date_from.clone(),
            due_date_to: self.due_date_to.clone(),
            overdue: self.overdue.clone(),
            ordering: self.ordering.clone(),
        }
    }

    /// Link to `page` of the same listing; page 1 drops the parameter
    fn page_link(&self, page: usize) -> String {
        let mut pairs: Vec<(&str, String)> = [
            ("search", &self.search),
            ("completed", &self.completed),
            ("due_date_from", &self.due_date_from),
            ("due_date_to", &self.due_date_to),
            ("overdue", &self.overdue),
            ("ordering", &self.ordering),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.clone().map(|v| (key, v)))
        .collect();
        if page > 1 {
            pairs.push(("page", page.to_string()));
        }

        match serde_urlencoded::to_string(&pairs) {
            Ok(query) if !query.is_empty() => format!("{}?{}", TASKS_PATH, query),
            _ => TASKS_PATH.to_string(),
        }
    }
}

/// Slice `tasks` into the requested page.
fn paginate(tasks: &[Task], query: &ListQuery, page_size: usize) -> Result<TaskPage, ApiError> {
    let page_size = page_size.max(1);
    let count = tasks.len();
    let num_pages = count.div_ceil(page_size).max(1);

    let page = match query.page.as_deref().map(str::trim) {
        None | Some("") => 1,
        Some("last") => num_pages,
        Some(raw) => raw
            .parse::<usize>()
            .ok()
            .filter(|p| *p >= 1)
            .ok_or(ApiError::InvalidPage)?,
    };
    if page > num_pages {
        return Err(ApiError::InvalidPage);
    }

    let results = tasks
        .iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .map(TaskJson::from)
        .collect();

    Ok(TaskPage {
        count,
        next: (page < num_pages).then(|| query.page_link(page + 1)),
        previous: (page > 1).then(|| query.page_link(page - 1)),
        results,
    })
}

/// Decode a request body into a JSON object.
///
/// Urlencoded forms become objects of strings; an empty body is an empty
/// object.
fn parse_body(headers: &HeaderMap, body: &[u8]) -> Result<Map<String, Value>, ApiError> {
    let is_form = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

    if is_form {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body)
            .map_err(|e| ApiError::BadRequest(format!("Form parse error - {}", e)))?;
        return Ok(pairs
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect());
    }

    if body.is_empty() {
        return Ok(Map::new());
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ApiError::BadRequest(
            "Invalid data. Expected a dictionary.".to_string(),
        )),
        Err(e) => Err(ApiError::BadRequest(format!("JSON parse error - {}", e))),
    }
}

fn string_field(data: &Map<String, Value>, field: &str, errors: &mut FieldErrors) -> Option<String> {
    match data.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Null => {
            errors.add(field, NOT_NULL);
            None
        }
        _ => {
            errors.add(field, "Not a valid string.");
            None
        }
    }
}

fn date_field(data: &Map<String, Value>, field: &str, errors: &mut FieldErrors) -> Option<NaiveDate> {
    match data.get(field)? {
        Value::String(s) => {
            let parsed = parse_date(s);
            if parsed.is_none() {
                errors.add(field, BAD_DATE);
            }
            parsed
        }
        Value::Null => {
            errors.add(field, NOT_NULL);
            None
        }
        _ => {
            errors.add(field, BAD_DATE);
            None
        }
    }
}

fn bool_field(data: &Map<String, Value>, field: &str, errors: &mut FieldErrors) -> Option<bool> {
    let parsed = match data.get(field)? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Value::String(s) => parse_bool(s),
        _ => None,
    };
    if parsed.is_none() {
        errors.add(field, BAD_BOOLEAN);
    }
    parsed
}

/// Task fields submitted to create, replace or patch endpoints
#[derive(Debug, Default)]
struct TaskInput {
    title: Option<String>,
    description: Option<String>,
    due_date: Option<NaiveDate>,
    completed: Option<bool>,
    errors: FieldErrors,
}

impl TaskInput {
    fn from_body(headers: &HeaderMap, body: &[u8]) -> Result<Self, ApiError> {
        let data = parse_body(headers, body)?;
        let mut errors = FieldErrors::new();
        let title = string_field(&data, "title", &mut errors);
        let description = string_field(&data, "description", &mut errors);
        let due_date = date_field(&data, "due_date", &mut errors);
        let completed = bool_field(&data, "completed", &mut errors);
        Ok(Self {
            title,
            description,
            due_date,
            completed,
            errors,
        })
    }

    /// Record "required" for the full-record fields that were not sent
    fn require_full(&mut self) {
        if self.title.is_none() && self.errors.get("title").is_none() {
            self.errors.add("title", REQUIRED);
        }
        if self.due_date.is_none() && self.errors.get("due_date").is_none() {
            self.errors.add("due_date", REQUIRED);
        }
    }

    fn into_new_task(mut self) -> Result<NewTask, ApiError> {
        self.require_full();
        match (self.title, self.due_date) {
            (Some(title), Some(due_date)) if self.errors.is_empty() => Ok(NewTask::new(
                title,
                due_date,
            )
            .with_description(self.description.unwrap_or_default())
            .with_completed(self.completed.unwrap_or(false))),
            _ => Err(ApiError::Validation(self.errors)),
        }
    }

    fn into_changes(mut self, full: bool) -> Result<TaskChanges, ApiError> {
        if full {
            self.require_full();
        }
        if !self.errors.is_empty() {
            return Err(ApiError::Validation(self.errors));
        }
        Ok(TaskChanges {
            title: self.title,
            description: self.description,
            due_date: self.due_date,
            completed: self.completed,
        })
    }
}

/// Lists the caller's tasks, filtered, ordered and paginated.
#[tracing::instrument(skip(state))]
pub async fn list_tasks_handler(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<ListQuery>,
) -> Result<Json<TaskPage>, ApiError> {
    let filter = query.filters().parse()?;
    let tasks = state.db.tasks(&user.id).list(&filter, state.today()).await?;
    Ok(Json(paginate(&tasks, &query, state.config.page_size)?))
}

#[tracing::instrument(skip(state, headers, body))]
pub async fn create_task_handler(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<TaskJson>), ApiError> {
    let new = TaskInput::from_body(&headers, &body)?.into_new_task()?;
    let task = state.db.tasks(&user.id).create(&new).await?;
    tracing::info!("Created task via API: {}", task.id);
    Ok((StatusCode::CREATED, Json(TaskJson::from(&task))))
}

#[tracing::instrument(skip(state))]
pub async fn get_task_handler(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<TaskJson>, ApiError> {
    let task = state.db.tasks(&user.id).get(&id).await?;
    Ok(Json(TaskJson::from(&task)))
}

async fn update_task(
    state: &AppState,
    user: &CurrentUser,
    id: &str,
    headers: &HeaderMap,
    body: &[u8],
    full: bool,
) -> Result<Json<TaskJson>, ApiError> {
    let tasks = state.db.tasks(&user.id);
    tasks.get(id).await?;

    let changes = TaskInput::from_body(headers, body)?.into_changes(full)?;
    let task = tasks.update(id, &changes).await?;
    Ok(Json(TaskJson::from(&task)))
}

/// PUT: `title` and `due_date` are required.
#[tracing::instrument(skip(state, headers, body))]
pub async fn replace_task_handler(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<TaskJson>, ApiError> {
    update_task(&state, &user, &id, &headers, &body, true).await
}

/// PATCH: any subset of fields.
#[tracing::instrument(skip(state, headers, body))]
pub async fn patch_task_handler(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<TaskJson>, ApiError> {
    update_task(&state, &user, &id, &headers, &body, false).await
}

#[tracing::instrument(skip(state))]
pub async fn delete_task_handler(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.db.tasks(&user.id).delete(&id).await?;
    tracing::info!("Deleted task via API: {}", id);
    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(skip(state))]
pub async fn task_stats_handler(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<TaskStats>, ApiError> {
    let stats = state.db.tasks(&user.id).stats(state.today()).await?;
    Ok(Json(stats))
}

/// Exchanges a username and password for a bearer token.
#[tracing::instrument(skip(state, headers, body))]
pub async fn token_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let data = parse_body(&headers, &body)?;
    let mut errors = FieldErrors::new();
    let username = string_field(&data, "username", &mut errors).filter(|s| !s.is_empty());
    let password = string_field(&data, "password", &mut errors).filter(|s| !s.is_empty());

    let (Some(username), Some(password)) = (username, password) else {
        for field in ["username", "password"] {
            if errors.get(field).is_none() && !data.get(field).is_some_and(non_blank) {
                errors.add(field, REQUIRED);
            }
        }
        return Err(ApiError::Validation(errors));
    };

    let account = state.db.users().authenticate(&username, &password).await?;
    let token = encode_jwt(
        &CurrentUser::from(&account),
        &state.config.jwt_secret,
        state.config.token_ttl_hours,
    )?;
    tracing::info!("Issued API token for {}", account.username);
    Ok(Json(json!({ "token": token })))
}

fn non_blank(value: &Value) -> bool {
    value.as_str().is_some_and(|s| !s.is_empty())
}
