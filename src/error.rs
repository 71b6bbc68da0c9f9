use crate::config::Environment;
use crate::db::DbError;
use crate::payments::PaymentError;
use crate::report_pdf::PdfError;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::error;

static EXPOSE_DETAIL: AtomicBool = AtomicBool::new(false);

/// Internal error detail is only ever sent to clients outside production.
pub fn configure(environment: Environment) {
    EXPOSE_DETAIL.store(!environment.is_production(), Ordering::Relaxed);
}

#[derive(Debug, Error)]
pub enum ApiError {
    // The `#[from]` attribute generates `From<JsonRejection> for ApiError`
    // implementation. See `thiserror` docs for more information
    #[error(transparent)]
    JsonExtractorRejection(#[from] JsonRejection),
    #[error(transparent)]
    Payment(#[from] PaymentError),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Database(#[from] DbError),
    #[error(transparent)]
    Pdf(#[from] PdfError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::JsonExtractorRejection(x) => match x {
                JsonRejection::JsonDataError(_) => StatusCode::BAD_REQUEST,
                JsonRejection::JsonSyntaxError(_) => StatusCode::BAD_REQUEST,
                JsonRejection::MissingJsonContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                JsonRejection::BytesRejection(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Payment(e) => match e {
                PaymentError::Validation(_) | PaymentError::InvalidSignature => StatusCode::BAD_REQUEST,
                PaymentError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
                PaymentError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                PaymentError::Provider { .. } => StatusCode::BAD_GATEWAY,
            },
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Database(_) | ApiError::Pdf(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.status();
        let payload = if code == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = ?self, "request failed");
            if EXPOSE_DETAIL.load(Ordering::Relaxed) {
                json!({ "message": "Internal server error", "detail": format!("{self:?}") })
            } else {
                json!({ "message": "Internal server error" })
            }
        } else {
            json!({ "message": self.to_string() })
        };
        (code, Json(payload)).into_response()
    }
}

/// Turns a handler panic into the same 500 body as any other internal error.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    error!(panic = %detail, "handler panicked");

    let payload = if EXPOSE_DETAIL.load(Ordering::Relaxed) {
        json!({ "message": "Internal server error", "detail": detail })
    } else {
        json!({ "message": "Internal server error" })
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
}
