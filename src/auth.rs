//! HTTP Basic Authentication for the GM panel
//!
//! A single shared secret gating the GM page and the GM WebSocket role. Not
//! a security boundary beyond keeping the audience out of the driver's seat.

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, Response, StatusCode},
    middleware::Next,
    response::{Html, IntoResponse},
};
use base64::Engine;
use std::sync::Arc;

/// Authentication configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Username for the GM panel (None = auth disabled)
    pub username: Option<String>,
    /// Password for the GM panel
    pub password: Option<String>,
}

impl AuthConfig {
    /// Load auth config from environment variables.
    /// GM_USERNAME and GM_PASSWORD must both be set to enable auth.
    pub fn from_env() -> Self {
        let username = std::env::var("GM_USERNAME")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let password = std::env::var("GM_PASSWORD")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        if username.is_some() && password.is_some() {
            tracing::info!("GM authentication enabled");
            Self { username, password }
        } else {
            if username.is_some() || password.is_some() {
                tracing::warn!(
                    "GM_USERNAME and GM_PASSWORD must both be set to enable authentication"
                );
            }
            tracing::warn!("GM authentication DISABLED - anyone can drive the show!");
            Self {
                username: None,
                password: None,
            }
        }
    }

    /// Check if authentication is enabled
    pub fn is_enabled(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }

    /// Validate credentials
    pub fn validate(&self, username: &str, password: &str) -> bool {
        match (&self.username, &self.password) {
            (Some(u), Some(p)) => {
                // Constant-time comparison to prevent timing attacks
                constant_time_eq(u.as_bytes(), username.as_bytes())
                    && constant_time_eq(p.as_bytes(), password.as_bytes())
            }
            _ => true, // Auth disabled, allow all
        }
    }
}

/// Constant-time byte comparison to prevent timing attacks
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

fn request_has_valid_credentials(auth_config: &AuthConfig, request: &Request<Body>) -> bool {
    let Some(auth_header) = request.headers().get(header::AUTHORIZATION) else {
        return false;
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return false;
    };
    let Some(credentials) = auth_str.strip_prefix("Basic ") else {
        return false;
    };
    let Ok(decoded) = base64::engine::general_purpose::STANDARD.decode(credentials) else {
        return false;
    };
    let Ok(decoded_str) = String::from_utf8(decoded) else {
        return false;
    };
    let Some((username, password)) = decoded_str.split_once(':') else {
        return false;
    };
    auth_config.validate(username, password)
}

fn unauthorized() -> Response<Body> {
    Response::builder()
        .status(StatusCode::UNAUTHORIZED)
        .header(header::WWW_AUTHENTICATE, "Basic realm=\"Showfloor GM\"")
        .body(Body::from("Unauthorized"))
        .unwrap()
}

/// Middleware for HTTP Basic Authentication on the GM panel route
pub async fn gm_auth_middleware(
    State(auth_config): State<Arc<AuthConfig>>,
    request: Request<Body>,
    next: Next,
) -> Response<Body> {
    if !auth_config.is_enabled() {
        return next.run(request).await;
    }

    if request_has_valid_credentials(&auth_config, &request) {
        return next.run(request).await;
    }

    unauthorized()
}

fn query_param_equals(request: &Request<Body>, key: &str, expected: &str) -> bool {
    let Some(query) = request.uri().query() else {
        return false;
    };
    for pair in query.split('&') {
        let Some((k, v)) = pair.split_once('=') else {
            continue;
        };
        if k == key && v == expected {
            return true;
        }
    }
    false
}

/// Middleware to require HTTP Basic Auth for GM WebSocket connections.
///
/// This prevents clients from taking over by connecting to `/ws?role=gm`.
pub async fn gm_ws_auth_middleware(
    State(auth_config): State<Arc<AuthConfig>>,
    request: Request<Body>,
    next: Next,
) -> Response<Body> {
    let is_gm_ws = request.uri().path() == "/ws" && query_param_equals(&request, "role", "gm");

    if !is_gm_ws {
        return next.run(request).await;
    }

    if !auth_config.is_enabled() {
        tracing::warn!(
            "GM WebSocket requested but GM authentication is DISABLED; set GM_USERNAME and GM_PASSWORD to prevent GM takeover"
        );
        return next.run(request).await;
    }

    if request_has_valid_credentials(&auth_config, &request) {
        return next.run(request).await;
    }

    unauthorized()
}

/// Serve the GM panel page (behind the auth middleware)
pub async fn serve_gm_html() -> impl IntoResponse {
    match tokio::fs::read_to_string("static/gm.html").await {
        Ok(contents) => Html(contents).into_response(),
        Err(_) => (StatusCode::NOT_FOUND, "gm.html not found").into_response(),
    }
}
