use crate::AppState;
use crate::config::ServerConfig;
use crate::error::{self, ApiError};
use crate::payments::webhook::SIGNATURE_HEADER;
use axum::Router;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use serde_json::json;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

pub mod contact;
pub mod donations;
pub mod jobs;
pub mod posts;
pub mod projects;
pub mod reports;
pub mod team;

pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server);
    Router::new()
        .route("/", get(home_handler))
        .nest("/api", api_router())
        .fallback(not_found)
        .layer(CatchPanicLayer::custom(error::panic_response))
        .layer(cors)
        .with_state(state)
}

/// An empty origin list, or one containing `*`, allows any origin.
fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<&str> = config
        .allowed_origins
        .iter()
        .map(|o| o.trim().trim_end_matches('/'))
        .filter(|o| !o.is_empty())
        .collect();

    let allow_origin = if origins.is_empty() || origins.contains(&"*") {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins.into_iter().filter_map(|origin| {
            HeaderValue::from_str(origin)
                .inspect_err(|_| tracing::warn!(origin, "ignoring malformed allowed origin"))
                .ok()
        }))
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            CONTENT_TYPE,
            AUTHORIZATION,
            HeaderName::from_static(SIGNATURE_HEADER),
        ])
}

fn api_router() -> Router<AppState> {
    Router::new()
        .nest("/donations", donations::router())
        .nest("/projects", projects::router())
        .nest("/posts", posts::router())
        .nest("/reports", reports::router())
        .nest("/leadership", team::leadership_router())
        .nest("/staff", team::staff_router())
        .nest("/jobs", jobs::router())
        .nest("/contact", contact::contact_router())
        .nest("/newsletter", contact::newsletter_router())
}

pub async fn home_handler() -> impl IntoResponse {
    "Foundation API is running"
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, axum::Json(json!({ "message": "Not found" })))
}

/// Unwraps a required text field, rejecting absent and blank values alike.
pub(crate) fn required(field: &str, value: Option<String>) -> Result<String, ApiError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("{field} is required")))
}

pub(crate) fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}
