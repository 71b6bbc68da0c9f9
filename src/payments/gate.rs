//! Decides, per provider, whether the configured credentials are real.
//!
//! Everything here is a pure function of the config value it is handed.

use crate::config::{CoinbaseConfig, FlutterwaveConfig, PaystackConfig, StripeConfig};

/// Fragments that only ever appear in example or template credentials.
const PLACEHOLDER_FRAGMENTS: &[&str] = &["placeholder", "your_", "your-", "changeme"];

/// Dummy keys copied verbatim from provider documentation.
const DOCUMENTED_DUMMIES: &[&str] = &["sk_test_xxx", "sk_test_...", "FLWSECK_TEST-xxx", "xxxxxxxx"];

pub fn is_placeholder(value: &str) -> bool {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return true;
    }
    let lowered = trimmed.to_ascii_lowercase();
    PLACEHOLDER_FRAGMENTS.iter().any(|f| lowered.contains(f))
        || DOCUMENTED_DUMMIES.iter().any(|d| trimmed.eq_ignore_ascii_case(d))
}

/// A credential counts only when present and not a placeholder.
pub fn is_real(value: Option<&str>) -> bool {
    value.is_some_and(|v| !is_placeholder(v))
}

pub trait Gate {
    fn is_enabled(&self) -> bool;
}

fn allowed(flag: Option<bool>) -> bool {
    flag.unwrap_or(true)
}

impl Gate for StripeConfig {
    fn is_enabled(&self) -> bool {
        allowed(self.enabled) && is_real(self.secret_key.as_deref())
    }
}

impl Gate for PaystackConfig {
    fn is_enabled(&self) -> bool {
        allowed(self.enabled) && is_real(self.secret_key.as_deref())
    }
}

impl Gate for FlutterwaveConfig {
    fn is_enabled(&self) -> bool {
        allowed(self.enabled) && is_real(self.secret_key.as_deref())
    }
}

impl Gate for CoinbaseConfig {
    /// Charge creation only needs the API key; webhooks are gated separately.
    fn is_enabled(&self) -> bool {
        allowed(self.enabled) && is_real(self.api_key.as_deref())
    }
}

impl CoinbaseConfig {
    pub fn webhook_enabled(&self) -> bool {
        allowed(self.enabled) && is_real(self.webhook_secret.as_deref())
    }
}
