use crate::AppState;
use crate::error::ApiError;
use crate::payments::webhook::SIGNATURE_HEADER;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use tracing::{debug, info, warn};

/// Takes the body as raw bytes: the signature covers the exact payload, so it
/// must not be deserialized before verification.
#[tracing::instrument(skip_all, fields(bytes = body.len()))]
pub async fn handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<&'static str, ApiError> {
    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
    let event = match state.gateway.webhook.verify(&body, signature) {
        Ok(event) => event,
        Err(e) => {
            warn!(error = %e, "Coinbase webhook rejected");
            return Err(e.into());
        }
    };

    if event.is_confirmed() {
        info!(
            event = ?event.id,
            charge = event.charge_code(),
            project = event.project_ref(),
            kind = %event.event_type,
            "Crypto donation confirmed"
        );
    } else {
        debug!(event = ?event.id, kind = %event.event_type, "Coinbase webhook received");
    }
    Ok("received")
}
