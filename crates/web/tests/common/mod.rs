//! Shared fixtures for router-level tests.
#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, header};
use chrono::{Duration, NaiveDate};
use serde_json::Value;
use std::sync::Arc;
use taskmate_db::{Database, NewTask, Task};
use taskmate_web::auth::{AUTH_COOKIE, CurrentUser, encode_jwt};
use taskmate_web::config::Config;
use taskmate_web::{AppState, create_router};
use tower::ServiceExt;

pub const SECRET: &str = "test-secret";
pub const PASSWORD: &str = "testpass123";

/// Router plus the state behind it, over a fresh in-memory database
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(Config::with_secret(SECRET)).await
    }

    pub async fn with_config(config: Config) -> Self {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let db = Database::connect_in_memory()
            .await
            .expect("Failed to open in-memory database");
        db.init().await.expect("Failed to initialize schema");
        let state = AppState::new(config, Arc::new(db)).expect("Failed to build state");
        Self {
            router: create_router(state.clone()),
            state,
        }
    }

    /// Register a user with [`PASSWORD`]
    pub async fn user(&self, username: &str) -> CurrentUser {
        let user = self
            .state
            .db
            .users()
            .register(username, None, PASSWORD)
            .await
            .expect("Failed to register user");
        CurrentUser::from(&user)
    }

    pub fn token(&self, user: &CurrentUser) -> String {
        encode_jwt(user, SECRET, 1).expect("Failed to sign token")
    }

    pub fn cookie(&self, user: &CurrentUser) -> String {
        format!("{}={}", AUTH_COOKIE, self.token(user))
    }

    pub fn today(&self) -> NaiveDate {
        self.state.today()
    }

    pub fn days_from_today(&self, days: i64) -> NaiveDate {
        self.today() + Duration::days(days)
    }

    /// Create a task owned by `owner`, due `days` from today
    pub async fn task(&self, owner: &CurrentUser, title: &str, days: i64, completed: bool) -> Task {
        let new = NewTask::new(title, self.days_from_today(days))
            .with_description(format!("{} description", title))
            .with_completed(completed);
        self.state
            .db
            .tasks(&owner.id)
            .create(&new)
            .await
            .expect("Failed to create task")
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Router failed")
    }
}

fn builder(method: &str, path: &str) -> axum::http::request::Builder {
    Request::builder().method(method).uri(path)
}

/// API request with an optional bearer token and JSON body
pub fn api_request(method: &str, path: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut request = builder(method, path);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(json) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => request.body(Body::empty()),
    };
    request.expect("Failed to build request")
}

/// Page GET with an optional session cookie
pub fn page_get(path: &str, cookie: Option<&str>) -> Request<Body> {
    let mut request = builder("GET", path);
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }
    request.body(Body::empty()).expect("Failed to build request")
}

/// Page POST of an urlencoded form with an optional session cookie
pub fn page_post(path: &str, cookie: Option<&str>, form: &str) -> Request<Body> {
    let mut request = builder("POST", path)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }
    request
        .body(Body::from(form.to_string()))
        .expect("Failed to build request")
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    String::from_utf8(bytes.to_vec()).expect("Body is not UTF-8")
}

pub async fn body_json(response: Response<Body>) -> Value {
    let text = body_text(response).await;
    serde_json::from_str(&text).expect("Body is not JSON")
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

/// Titles of the `results` array of a list response
pub fn result_titles(body: &Value) -> Vec<String> {
    body["results"]
        .as_array()
        .map(|results| {
            results
                .iter()
                .filter_map(|t| t["title"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
