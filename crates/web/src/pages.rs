//! Server-rendered pages: sign-up, login, and task CRUD.

use askama::Template;
use axum::Form;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum_extra::extract::CookieJar;
use chrono::NaiveDate;
use serde::Deserialize;
use taskmate_db::{
    DbError, FieldErrors, FilterParams, NewTask, Task, TaskChanges, TaskStats, parse_checkbox,
    parse_date,
};

use crate::AppState;
use crate::auth::{
    CurrentUser, encode_jwt, expired_session_cookie, found, safe_next, session_cookie,
};

/// Custom error type for page handler operations.
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("Template rendering failed")]
    Template(#[from] askama::Error),
    #[error("Database error: {0}")]
    Db(#[from] DbError),
    #[error("Token signing failed")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("Page not found")]
    NotFound,
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        match self {
            PageError::NotFound | PageError::Db(DbError::NotFound { .. }) => not_found_response(),
            other => {
                tracing::error!("Page request failed: {}", other);
                let user_facing_error_message = "An unexpected error occurred while processing your request. Please try again later.";
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html(format!(
                        "<h1>Internal Server Error</h1><p>{}</p>",
                        user_facing_error_message
                    )),
                )
                    .into_response()
            }
        }
    }
}

fn not_found_response() -> Response {
    let Ok(rendered) = (NotFoundTemplate { user: None }).render() else {
        return StatusCode::NOT_FOUND.into_response();
    };
    (StatusCode::NOT_FOUND, Html(rendered)).into_response()
}

fn render<T: Template>(template: &T) -> Result<Response, PageError> {
    Ok(Html(template.render()?).into_response())
}

/// Task fields as displayed on pages
pub struct TaskView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub due_date: String,
    pub completed: bool,
    pub overdue: bool,
}

impl TaskView {
    fn new(task: &Task, today: NaiveDate) -> Self {
        Self {
            id: task.id.clone(),
            title: task.title.clone(),
            description: task.description.clone(),
            due_date: task.due_date.to_string(),
            completed: task.completed,
            overdue: task.is_overdue(today),
        }
    }
}

/// Current filter values, echoed back into the filter form
#[derive(Default)]
pub struct FilterFormValues {
    pub search: String,
    pub completed: String,
    pub due_date_from: String,
    pub due_date_to: String,
    pub overdue: String,
    pub ordering: String,
}

impl From<&FilterParams> for FilterFormValues {
    fn from(params: &FilterParams) -> Self {
        let value = |v: &Option<String>| v.clone().unwrap_or_default();
        Self {
            search: value(&params.search),
            completed: value(&params.completed).to_ascii_lowercase(),
            due_date_from: value(&params.due_date_from),
            due_date_to: value(&params.due_date_to),
            overdue: value(&params.overdue).to_ascii_lowercase(),
            ordering: value(&params.ordering),
        }
    }
}

#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate {
    user: Option<String>,
    username: String,
    next: String,
    error: Option<String>,
}

#[derive(Template)]
#[template(path = "signup.html")]
struct SignupTemplate {
    user: Option<String>,
    username: String,
    email: String,
    errors: FieldErrors,
}

#[derive(Template)]
#[template(path = "task/task_list.html")]
struct TaskListTemplate {
    user: Option<String>,
    tasks: Vec<TaskView>,
    stats: TaskStats,
    filters: FilterFormValues,
    errors: FieldErrors,
}

#[derive(Template)]
#[template(path = "task/task_form.html")]
struct TaskFormTemplate {
    user: Option<String>,
    heading: &'static str,
    action: String,
    title: String,
    description: String,
    due_date: String,
    completed: bool,
    show_completed: bool,
    errors: FieldErrors,
}

#[derive(Template)]
#[template(path = "task/task_confirm_delete.html")]
struct TaskConfirmDeleteTemplate {
    user: Option<String>,
    task: TaskView,
}

#[derive(Template)]
#[template(path = "404.html")]
struct NotFoundTemplate {
    user: Option<String>,
}

// ========================================
// Account pages
// ========================================

#[derive(Deserialize, Debug)]
pub struct NextQuery {
    pub next: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub next: Option<String>,
}

/// Handles GET requests to display the login page.
#[tracing::instrument]
pub async fn login_page_handler(
    current_user: Option<Extension<CurrentUser>>,
    Query(query): Query<NextQuery>,
) -> Result<Response, PageError> {
    render(&LoginTemplate {
        user: current_user.map(|Extension(u)| u.username),
        username: String::new(),
        next: safe_next(query.next.as_deref()).to_string(),
        error: None,
    })
}

/// Checks the submitted credentials and starts a cookie session.
#[tracing::instrument(skip(state, jar, form))]
pub async fn login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, PageError> {
    let next = safe_next(form.next.as_deref()).to_string();

    match state
        .db
        .users()
        .authenticate(&form.username, &form.password)
        .await
    {
        Ok(user) => {
            let current = CurrentUser::from(&user);
            let token = encode_jwt(
                &current,
                &state.config.jwt_secret,
                state.config.token_ttl_hours,
            )?;
            tracing::info!("User logged in: {}", current.username);
            let jar = jar.add(session_cookie(token, &state.config));
            Ok((jar, found(&next)).into_response())
        }
        Err(DbError::InvalidCredentials) => render(&LoginTemplate {
            user: None,
            username: form.username,
            next,
            error: Some(
                "Please enter a correct username and password. Note that both fields may be case-sensitive."
                    .to_string(),
            ),
        }),
        Err(e) => Err(e.into()),
    }
}

/// Ends the cookie session.
#[tracing::instrument(skip(jar))]
pub async fn logout_handler(jar: CookieJar) -> Response {
    (jar.remove(expired_session_cookie()), found("/login/")).into_response()
}

#[derive(Deserialize, Default)]
pub struct SignupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

#[tracing::instrument]
pub async fn signup_page_handler(
    current_user: Option<Extension<CurrentUser>>,
) -> Result<Response, PageError> {
    render(&SignupTemplate {
        user: current_user.map(|Extension(u)| u.username),
        username: String::new(),
        email: String::new(),
        errors: FieldErrors::new(),
    })
}

/// Registers an account and sends the new user to the login page.
#[tracing::instrument(skip(state, form))]
pub async fn signup_handler(
    State(state): State<AppState>,
    Form(form): Form<SignupForm>,
) -> Result<Response, PageError> {
    let mut errors = FieldErrors::new();

    if form.password1 != form.password2 {
        errors.add("password2", "The two password fields didn't match.");
    } else {
        match state
            .db
            .users()
            .register(&form.username, Some(&form.email), &form.password1)
            .await
        {
            Ok(user) => {
                tracing::info!("Registered user: {}", user.username);
                return Ok(found("/login/"));
            }
            Err(DbError::Validation(field_errors)) => errors = field_errors,
            Err(DbError::UsernameTaken { .. }) => {
                errors.add("username", "A user with that username already exists.")
            }
            Err(e) => return Err(e.into()),
        }
    }

    render(&SignupTemplate {
        user: None,
        username: form.username,
        email: form.email,
        errors,
    })
}

// ========================================
// Task pages
// ========================================

/// Lists the user's tasks with the filter form and summary counts.
///
/// Invalid filter values re-render the page with messages and no tasks.
#[tracing::instrument(skip(state))]
pub async fn task_list_handler(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(params): Query<FilterParams>,
) -> Result<Response, PageError> {
    let today = state.today();
    let tasks = state.db.tasks(&user.id);

    let (filtered, errors) = match params.parse() {
        Ok(filter) => (tasks.list(&filter, today).await?, FieldErrors::new()),
        Err(DbError::Validation(errors)) => (Vec::new(), errors),
        Err(e) => return Err(e.into()),
    };
    let stats = tasks.stats(today).await?;

    render(&TaskListTemplate {
        user: Some(user.username),
        tasks: filtered.iter().map(|t| TaskView::new(t, today)).collect(),
        stats,
        filters: FilterFormValues::from(&params),
        errors,
    })
}

#[derive(Deserialize, Default)]
pub struct TaskForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub due_date: String,
    pub completed: Option<String>,
}

/// A task form that passed validation
struct ValidTaskForm {
    title: String,
    description: String,
    due_date: NaiveDate,
    completed: bool,
}

impl TaskForm {
    fn validate(&self) -> Result<ValidTaskForm, FieldErrors> {
        let mut errors = FieldErrors::new();

        let title = self.title.trim();
        if title.is_empty() {
            errors.add("title", "This field is required.");
        }

        let due_date = match self.due_date.trim() {
            "" => {
                errors.add("due_date", "This field is required.");
                None
            }
            raw => {
                let parsed = parse_date(raw);
                if parsed.is_none() {
                    errors.add("due_date", "Enter a valid date.");
                }
                parsed
            }
        };

        match due_date {
            Some(due_date) if errors.is_empty() => Ok(ValidTaskForm {
                title: title.to_string(),
                description: self.description.clone(),
                due_date,
                completed: parse_checkbox(self.completed.as_deref()),
            }),
            _ => Err(errors),
        }
    }
}

/// Build the form template for creating or updating a task
fn task_form_template(
    user: &CurrentUser,
    task_id: Option<&str>,
    form: &TaskForm,
    errors: FieldErrors,
) -> TaskFormTemplate {
    let (heading, action) = match task_id {
        Some(id) => ("Update task", format!("/task/{}/update/", id)),
        None => ("New task", "/task/create/".to_string()),
    };
    TaskFormTemplate {
        user: Some(user.username.clone()),
        heading,
        action,
        title: form.title.clone(),
        description: form.description.clone(),
        due_date: form.due_date.clone(),
        completed: parse_checkbox(form.completed.as_deref()),
        show_completed: task_id.is_some(),
        errors,
    }
}

#[tracing::instrument]
pub async fn task_create_page_handler(
    Extension(user): Extension<CurrentUser>,
) -> Result<Response, PageError> {
    render(&task_form_template(
        &user,
        None,
        &TaskForm::default(),
        FieldErrors::new(),
    ))
}

/// Creates a task owned by the current user.
#[tracing::instrument(skip(state, form))]
pub async fn task_create_handler(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Form(form): Form<TaskForm>,
) -> Result<Response, PageError> {
    let valid = match form.validate() {
        Ok(valid) => valid,
        Err(errors) => return render(&task_form_template(&user, None, &form, errors)),
    };

    let new = NewTask::new(valid.title, valid.due_date).with_description(valid.description);
    match state.db.tasks(&user.id).create(&new).await {
        Ok(task) => {
            tracing::info!("Created task: {}", task.id);
            Ok(found("/"))
        }
        Err(DbError::Validation(errors)) => {
            render(&task_form_template(&user, None, &form, errors))
        }
        Err(e) => Err(e.into()),
    }
}

#[tracing::instrument(skip(state))]
pub async fn task_update_page_handler(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Response, PageError> {
    let task = state.db.tasks(&user.id).get(&id).await?;
    let form = TaskForm {
        title: task.title,
        description: task.description,
        due_date: task.due_date.to_string(),
        completed: task.completed.then(|| "on".to_string()),
    };
    render(&task_form_template(&user, Some(&id), &form, FieldErrors::new()))
}

/// Replaces the editable fields of one of the user's tasks.
#[tracing::instrument(skip(state, form))]
pub async fn task_update_handler(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Form(form): Form<TaskForm>,
) -> Result<Response, PageError> {
    let tasks = state.db.tasks(&user.id);
    tasks.get(&id).await?;

    let valid = match form.validate() {
        Ok(valid) => valid,
        Err(errors) => return render(&task_form_template(&user, Some(&id), &form, errors)),
    };

    let changes = TaskChanges::new()
        .with_title(valid.title)
        .with_description(valid.description)
        .with_due_date(valid.due_date)
        .with_completed(valid.completed);
    match tasks.update(&id, &changes).await {
        Ok(_) => Ok(found("/")),
        Err(DbError::Validation(errors)) => {
            render(&task_form_template(&user, Some(&id), &form, errors))
        }
        Err(e) => Err(e.into()),
    }
}

#[tracing::instrument(skip(state))]
pub async fn task_delete_page_handler(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Response, PageError> {
    let task = state.db.tasks(&user.id).get(&id).await?;
    render(&TaskConfirmDeleteTemplate {
        user: Some(user.username),
        task: TaskView::new(&task, state.today()),
    })
}

#[tracing::instrument(skip(state))]
pub async fn task_delete_handler(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Response, PageError> {
    state.db.tasks(&user.id).delete(&id).await?;
    tracing::info!("Deleted task: {}", id);
    Ok(found("/"))
}

pub async fn not_found_handler() -> PageError {
    PageError::NotFound
}
