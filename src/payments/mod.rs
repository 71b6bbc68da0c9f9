//! Donation gateway: one adapter per payment provider, a configuration gate
//! deciding which of them may run, and webhook verification for the crypto
//! gateway.

use crate::config::{Config, PaymentsConfig};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use thiserror::Error;
use tracing::{error, warn};

pub mod availability;
pub mod coinbase;
pub mod flutterwave;
pub mod gate;
pub mod paystack;
pub mod stripe;
pub mod webhook;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Stripe,
    Paystack,
    Flutterwave,
    Coinbase,
}

impl Provider {
    pub const ALL: [Provider; 4] = [
        Provider::Stripe,
        Provider::Paystack,
        Provider::Flutterwave,
        Provider::Coinbase,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Provider::Stripe => "stripe",
            Provider::Paystack => "paystack",
            Provider::Flutterwave => "flutterwave",
            Provider::Coinbase => "coinbase",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Provider::Stripe => "Stripe",
            Provider::Paystack => "Paystack",
            Provider::Flutterwave => "Flutterwave",
            Provider::Coinbase => "Coinbase Commerce",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("{0}")]
    Validation(String),
    #[error("{} payments are not configured. Please contact the site administrator.", .0.display_name())]
    NotConfigured(Provider),
    #[error("{provider} did not respond in time")]
    Timeout { provider: Provider },
    #[error("{message}")]
    Provider {
        provider: Provider,
        status: Option<u16>,
        message: String,
    },
    #[error("Invalid signature")]
    InvalidSignature,
}

/// Donation as posted by the website. Every field is optional on the wire so
/// that a missing amount produces the same message as a zero one.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationRequest {
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub project_id: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "phone_number", alias = "phoneNumber")]
    pub phone_number: Option<String>,
}

/// A request that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct Donation {
    pub amount: Decimal,
    pub currency: String,
    pub project_id: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
}

impl Donation {
    /// Amount in the currency's hundredth unit (cents, kobo).
    pub fn minor_units(&self) -> Result<i64, PaymentError> {
        self.amount
            .checked_mul(Decimal::ONE_HUNDRED)
            .map(|m| m.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
            .and_then(|m| m.to_i64())
            .filter(|m| *m > 0)
            .ok_or_else(|| PaymentError::Validation("Invalid amount".to_string()))
    }

    /// Amount in major units with two decimals, for providers that take strings.
    /// Dust that rounds to nothing is rejected like any other non-positive amount.
    pub fn major_units(&self) -> Result<String, PaymentError> {
        let rounded = self
            .amount
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        if rounded <= Decimal::ZERO {
            return Err(PaymentError::Validation("Invalid amount".to_string()));
        }
        Ok(format!("{rounded:.2}"))
    }

    pub fn project_ref(&self) -> &str {
        self.project_id.as_deref().unwrap_or("general")
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

impl DonationRequest {
    pub fn validate(&self, requires_email: bool, default_currency: &str) -> Result<Donation, PaymentError> {
        let amount = match self.amount {
            Some(amount) if amount > Decimal::ZERO => amount,
            _ => return Err(PaymentError::Validation("Invalid amount".to_string())),
        };

        let email = non_blank(&self.email);
        match &email {
            None if requires_email => {
                return Err(PaymentError::Validation("Email is required".to_string()));
            }
            Some(email) if !email.contains('@') => {
                return Err(PaymentError::Validation("Invalid email address".to_string()));
            }
            _ => {}
        }

        let currency = match non_blank(&self.currency) {
            Some(code) if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) => code,
            Some(_) => return Err(PaymentError::Validation("Invalid currency".to_string())),
            None => default_currency.to_string(),
        };

        Ok(Donation {
            amount,
            currency,
            project_id: non_blank(&self.project_id),
            email,
            phone_number: non_blank(&self.phone_number),
        })
    }
}

/// What a successful charge creation hands back to the website.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProviderCharge {
    /// Card checkout; the browser only needs the session id.
    Session { id: String },
    /// Provider body relayed as received.
    Raw(Value),
}

#[derive(Debug, Clone)]
pub struct Redirects {
    pub success: String,
    pub cancel: String,
}

impl From<&PaymentsConfig> for Redirects {
    fn from(config: &PaymentsConfig) -> Self {
        Self {
            success: config.success_url(),
            cancel: config.cancel_url(),
        }
    }
}

pub trait DonationAdapter {
    const PROVIDER: Provider;
    const REQUIRES_EMAIL: bool;
    const DEFAULT_CURRENCY: &'static str;

    fn is_enabled(&self) -> bool;

    /// Issues exactly one outbound call. Callers go through [`initiate`].
    fn create_charge(
        &self,
        donation: &Donation,
    ) -> impl Future<Output = Result<ProviderCharge, PaymentError>> + Send;
}

/// The common adapter contract: gate, validate, then a single provider call.
pub async fn initiate<A>(adapter: &A, request: &DonationRequest) -> Result<ProviderCharge, PaymentError>
where
    A: DonationAdapter + Sync,
{
    if !adapter.is_enabled() {
        warn!(provider = %A::PROVIDER, "donation attempted while provider is not configured");
        return Err(PaymentError::NotConfigured(A::PROVIDER));
    }
    let donation = request.validate(A::REQUIRES_EMAIL, A::DEFAULT_CURRENCY)?;
    adapter.create_charge(&donation).await
}

/// Sends one provider request and returns its JSON body, mapping transport
/// failures, timeouts and non-success statuses to [`PaymentError`].
pub(crate) async fn send_json(
    provider: Provider,
    request: reqwest::RequestBuilder,
) -> Result<Value, PaymentError> {
    let response = match request.send().await {
        Ok(response) => response,
        Err(e) if e.is_timeout() => {
            error!(%provider, error = %e, "provider call timed out");
            return Err(PaymentError::Timeout { provider });
        }
        Err(e) => {
            error!(%provider, error = ?e, "provider call failed");
            return Err(PaymentError::Provider {
                provider,
                status: None,
                message: format!("Could not reach {}", provider.display_name()),
            });
        }
    };

    let status = response.status();
    let body = match response.text().await {
        Ok(body) => body,
        Err(e) if e.is_timeout() => return Err(PaymentError::Timeout { provider }),
        Err(e) => {
            error!(%provider, error = ?e, "failed to read provider response");
            String::new()
        }
    };
    let json: Value = serde_json::from_str(&body).unwrap_or(Value::Null);

    if !status.is_success() {
        error!(%provider, status = status.as_u16(), body = %body, "provider rejected request");
        let message = provider_message(&json)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Provider error").to_string());
        return Err(PaymentError::Provider {
            provider,
            status: Some(status.as_u16()),
            message,
        });
    }
    if json.is_null() {
        error!(%provider, body = %body, "provider returned a non-JSON body");
        return Err(PaymentError::Provider {
            provider,
            status: Some(status.as_u16()),
            message: format!("Unexpected response from {}", provider.display_name()),
        });
    }
    Ok(json)
}

/// Providers nest their error text differently; take the first one present.
fn provider_message(body: &Value) -> Option<String> {
    body.pointer("/error/message")
        .or_else(|| body.get("message"))
        .or_else(|| body.get("error").filter(|e| e.is_string()))
        .and_then(Value::as_str)
        .map(ToString::to_string)
}

/// All four adapters plus the webhook verifier, built once from configuration.
#[derive(Clone)]
pub struct DonationGateway {
    pub stripe: stripe::StripeAdapter,
    pub paystack: paystack::PaystackAdapter,
    pub flutterwave: flutterwave::FlutterwaveAdapter,
    pub coinbase: coinbase::CoinbaseAdapter,
    pub webhook: webhook::WebhookVerifier,
}

impl DonationGateway {
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let payments = &config.payments;
        let client = reqwest::Client::builder()
            .timeout(payments.provider_timeout())
            .build()?;
        let redirects = Redirects::from(payments);

        Ok(Self {
            stripe: stripe::StripeAdapter::new(payments.stripe.clone(), redirects.clone(), client.clone()),
            paystack: paystack::PaystackAdapter::new(payments.paystack.clone(), redirects.clone(), client.clone()),
            flutterwave: flutterwave::FlutterwaveAdapter::new(
                payments.flutterwave.clone(),
                redirects.clone(),
                client.clone(),
            ),
            coinbase: coinbase::CoinbaseAdapter::new(payments.coinbase.clone(), redirects, client),
            webhook: webhook::WebhookVerifier::new(payments.coinbase.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn request(amount: &str) -> DonationRequest {
        DonationRequest {
            amount: Some(Decimal::from_str(amount).unwrap()),
            ..DonationRequest::default()
        }
    }

    #[test]
    fn rejects_non_positive_and_missing_amounts() {
        for amount in ["0", "-5", "-0.01"] {
            let err = request(amount).validate(false, "usd").unwrap_err();
            assert_eq!(err.to_string(), "Invalid amount");
        }
        let err = DonationRequest::default().validate(false, "usd").unwrap_err();
        assert_eq!(err.to_string(), "Invalid amount");
    }

    #[test]
    fn email_is_checked_only_where_required() {
        assert!(request("10").validate(false, "usd").is_ok());
        let err = request("10").validate(true, "NGN").unwrap_err();
        assert_eq!(err.to_string(), "Email is required");

        let mut with_bad_email = request("10");
        with_bad_email.email = Some("not-an-email".to_string());
        assert!(matches!(
            with_bad_email.validate(true, "NGN"),
            Err(PaymentError::Validation(_))
        ));
    }

    #[test]
    fn currency_override_must_be_a_code() {
        let mut req = request("10");
        req.currency = Some("EUR".to_string());
        assert_eq!(req.validate(false, "usd").unwrap().currency, "EUR");
        req.currency = Some("euros".to_string());
        assert!(req.validate(false, "usd").is_err());
    }

    #[test]
    fn converts_to_minor_and_major_units() {
        let donation = request("50").validate(false, "usd").unwrap();
        assert_eq!(donation.minor_units().unwrap(), 5000);
        assert_eq!(donation.major_units().unwrap(), "50.00");
        assert_eq!(donation.project_ref(), "general");

        let donation = request("19.999").validate(false, "usd").unwrap();
        assert_eq!(donation.minor_units().unwrap(), 2000);

        let dust = request("0.001").validate(false, "usd").unwrap();
        assert!(dust.minor_units().is_err());
        assert_eq!(dust.major_units().unwrap_err().to_string(), "Invalid amount");

        let half_cent = request("0.005").validate(false, "usd").unwrap();
        assert_eq!(half_cent.major_units().unwrap(), "0.01");
    }

    #[test]
    fn deserializes_wire_names() {
        let req: DonationRequest = serde_json::from_str(
            r#"{"amount": 25.5, "projectId": "abc", "email": "a@b.org", "phone_number": "0800"}"#,
        )
        .unwrap();
        let donation = req.validate(true, "NGN").unwrap();
        assert_eq!(donation.project_ref(), "abc");
        assert_eq!(donation.phone_number.as_deref(), Some("0800"));
        assert_eq!(donation.minor_units().unwrap(), 2550);
    }

    #[test]
    fn not_configured_message_never_names_the_secret() {
        let message = PaymentError::NotConfigured(Provider::Stripe).to_string();
        assert!(message.contains("not configured"));
        assert!(!message.to_lowercase().contains("key"));
    }

    #[test]
    fn picks_provider_error_text() {
        let stripe = serde_json::json!({"error": {"message": "No such price"}});
        let paystack = serde_json::json!({"status": false, "message": "Invalid key"});
        assert_eq!(provider_message(&stripe).as_deref(), Some("No such price"));
        assert_eq!(provider_message(&paystack).as_deref(), Some("Invalid key"));
        assert_eq!(provider_message(&Value::Null), None);
    }
}
