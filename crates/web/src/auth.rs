//! Token issuing and request authentication
//!
//! Pages carry a signed JWT in the `auth_token` cookie; the API expects
//! the same kind of token in an `Authorization: Bearer` header. Both
//! middlewares only populate the [`CurrentUser`] extension; enforcement is
//! done by [`login_redirect_middleware`] and [`require_api_auth_middleware`].

use axum::Json;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use taskmate_db::{User, UserId};

use crate::AppState;
use crate::config::Config;

/// Name of the session cookie
pub const AUTH_COOKIE: &str = "auth_token";

/// Represents the currently authenticated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: UserId,
    pub username: String,
}

impl CurrentUser {
    pub fn new(id: UserId, username: String) -> Self {
        Self { id, username }
    }
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self::new(user.id.clone(), user.username.clone())
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Claims {
    pub sub: String,      // User identity
    pub username: String, // Username at issue time
    pub exp: usize,       // Expiry time of the token
    pub iat: usize,       // Issued at time of the token
}

pub fn encode_jwt(
    user: &CurrentUser,
    jwt_secret: &str,
    ttl_hours: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now();
    let expire = chrono::Duration::hours(ttl_hours);
    let claims = Claims {
        sub: user.id.to_string(),
        username: user.username.clone(),
        exp: (now + expire).timestamp() as usize,
        iat: now.timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
}

pub fn decode_jwt(token: &str, jwt_secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

fn current_user_from_token(token: &str, jwt_secret: &str) -> Option<CurrentUser> {
    match decode_jwt(token, jwt_secret) {
        Ok(claims) => Some(CurrentUser::new(UserId::new(claims.sub), claims.username)),
        Err(e) => {
            tracing::debug!("Rejected token: {}", e);
            None
        }
    }
}

/// Build the session cookie holding `token`
pub fn session_cookie(token: String, config: &Config) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, token))
        .http_only(true)
        .secure(config.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::hours(config.token_ttl_hours))
        .path("/")
        .build()
}

/// Cookie that clears the session when removed from a jar
pub fn expired_session_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::from(AUTH_COOKIE);
    cookie.set_path("/");
    cookie
}

/// Sets the CurrentUser extension from a valid session cookie.
pub async fn session_user_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token_cookie) = jar.get(AUTH_COOKIE)
        && let Some(user) = current_user_from_token(token_cookie.value(), &state.config.jwt_secret)
    {
        request.extensions_mut().insert(user);
    }

    next.run(request).await
}

/// Redirects unauthenticated page requests to the login page with a
/// `next` parameter pointing back at the requested path.
pub async fn login_redirect_middleware(request: Request, next: Next) -> Response {
    if request.extensions().get::<CurrentUser>().is_none() {
        let target = request
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let query = serde_urlencoded::to_string([("next", target)]).unwrap_or_default();
        return found(&format!("/login/?{}", query));
    }

    next.run(request).await
}

/// Sets the CurrentUser extension from an `Authorization: Bearer` header.
pub async fn bearer_user_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Response {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));
    if let Some(user) = token.and_then(|t| current_user_from_token(t.trim(), &state.config.jwt_secret))
    {
        request.extensions_mut().insert(user);
    }

    next.run(request).await
}

/// Rejects API requests without an authenticated user with 403.
pub async fn require_api_auth_middleware(request: Request, next: Next) -> Response {
    if request.extensions().get::<CurrentUser>().is_none() {
        return (
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({
                "detail": "Authentication credentials were not provided."
            })),
        )
            .into_response();
    }

    next.run(request).await
}

/// A 302 redirect to `location`
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Accept only local absolute paths as post-login targets.
///
/// Browsers read `\` as `/` and drop tabs and newlines, so `/\host` and
/// `/\t/host` are treated as scheme-relative and rejected.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if is_local_path(path) => path,
        _ => "/",
    }
}

fn is_local_path(path: &str) -> bool {
    let mut chars = path.chars();
    chars.next() == Some('/')
        && !matches!(chars.next(), Some('/' | '\\'))
        && !path.chars().any(|c| c == '\\' || c.is_control())
}
