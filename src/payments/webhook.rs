//! Coinbase Commerce webhook authentication.
//!
//! The signature header is a hex HMAC-SHA256 over the exact request bytes, so
//! verification must run on the raw body before anything parses it.

use crate::config::CoinbaseConfig;
use crate::payments::{PaymentError, Provider};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-cc-webhook-signature";

/// Hex-encoded HMAC-SHA256 of `body` under `secret`.
pub fn compute_signature(secret: &[u8], body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time check of a hex signature. Malformed hex compares against a
/// zeroed tag so it fails the same way a wrong signature does.
pub fn verify_signature(secret: &[u8], body: &[u8], signature: &str) -> bool {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(body);
    let expected = hex::decode(signature.trim()).unwrap_or_else(|_| vec![0u8; 32]);
    mac.verify_slice(&expected).is_ok()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub data: Value,
}

impl WebhookEvent {
    /// `charge:resolved` is a manually-settled underpayment; both mean the
    /// donation went through.
    pub fn is_confirmed(&self) -> bool {
        matches!(self.event_type.as_str(), "charge:confirmed" | "charge:resolved")
    }

    pub fn project_ref(&self) -> Option<&str> {
        self.data.pointer("/metadata/projectId").and_then(Value::as_str)
    }

    pub fn charge_code(&self) -> Option<&str> {
        self.data.get("code").and_then(Value::as_str)
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    event: WebhookEvent,
}

#[derive(Clone, Debug)]
pub struct WebhookVerifier {
    config: CoinbaseConfig,
}

impl WebhookVerifier {
    pub fn new(config: CoinbaseConfig) -> Self {
        Self { config }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.webhook_enabled()
    }

    /// Authenticates `raw_body` and only then parses it.
    pub fn verify(&self, raw_body: &[u8], signature: Option<&str>) -> Result<WebhookEvent, PaymentError> {
        let secret = match self.config.webhook_secret.as_deref() {
            Some(secret) if self.is_enabled() => secret,
            _ => return Err(PaymentError::NotConfigured(Provider::Coinbase)),
        };
        let signature = signature.ok_or(PaymentError::InvalidSignature)?;
        if !verify_signature(secret.as_bytes(), raw_body, signature) {
            return Err(PaymentError::InvalidSignature);
        }

        let envelope: Envelope = serde_json::from_slice(raw_body)
            .map_err(|e| PaymentError::Validation(format!("Invalid webhook payload: {e}")))?;
        Ok(envelope.event)
    }
}
