//! HTTP surfaces for taskmate
//!
//! Server-rendered pages under `/` and a JSON API under `/api/`, both
//! backed by the owner-scoped repositories in `taskmate-db`.

pub mod api;
pub mod auth;
pub mod config;
pub mod pages;

use axum::Router;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use chrono::NaiveDate;
use std::sync::Arc;
use taskmate_db::{Database, TimeZone};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::Config;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Arc<Database>,
    pub time_zone: TimeZone,
}

impl AppState {
    /// Build the state, validating the configured time zone.
    pub fn new(config: Config, db: Arc<Database>) -> anyhow::Result<Self> {
        let time_zone = config.time_zone()?;
        Ok(Self {
            config: Arc::new(config),
            db,
            time_zone,
        })
    }

    /// The evaluation date for overdue checks
    pub fn today(&self) -> NaiveDate {
        self.time_zone.today()
    }
}

/// Assemble the full application router.
pub fn create_router(state: AppState) -> Router {
    let protected_pages = Router::new()
        .route("/", get(pages::task_list_handler))
        .route(
            "/task/create/",
            get(pages::task_create_page_handler).post(pages::task_create_handler),
        )
        .route(
            "/task/{id}/update/",
            get(pages::task_update_page_handler).post(pages::task_update_handler),
        )
        .route(
            "/task/{id}/delete/",
            get(pages::task_delete_page_handler).post(pages::task_delete_handler),
        )
        .layer(from_fn(auth::login_redirect_middleware));

    let public_pages = Router::new()
        .route(
            "/login/",
            get(pages::login_page_handler).post(pages::login_handler),
        )
        .route("/logout/", post(pages::logout_handler))
        .route(
            "/signup/",
            get(pages::signup_page_handler).post(pages::signup_handler),
        );

    let page_routes = protected_pages.merge(public_pages).layer(from_fn_with_state(
        state.clone(),
        auth::session_user_middleware,
    ));

    let api_routes = Router::new()
        .route(
            "/api/tasks/",
            get(api::list_tasks_handler).post(api::create_task_handler),
        )
        .route("/api/tasks/stats/", get(api::task_stats_handler))
        .route(
            "/api/tasks/{id}/",
            get(api::get_task_handler)
                .put(api::replace_task_handler)
                .patch(api::patch_task_handler)
                .delete(api::delete_task_handler),
        )
        .layer(from_fn(auth::require_api_auth_middleware))
        .route("/api/token/", post(api::token_handler))
        .layer(from_fn_with_state(
            state.clone(),
            auth::bearer_user_middleware,
        ));

    Router::new()
        .route("/health", get(health_check_handler))
        .merge(page_routes)
        .merge(api_routes)
        .fallback(pages::not_found_handler)
        .with_state(state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

#[tracing::instrument(skip(config, db))]
pub async fn start_web_server(config: Config, db: Arc<Database>) -> anyhow::Result<()> {
    let server_address = format!("{}:{}", config.host, config.port);
    let state = AppState::new(config, db)?;

    let listener = tokio::net::TcpListener::bind(&server_address).await?;
    tracing::info!("Web server running on http://{}", server_address);

    axum::serve(listener, create_router(state)).await?;
    Ok(())
}

#[tracing::instrument]
pub async fn health_check_handler() -> &'static str {
    "OK"
}
