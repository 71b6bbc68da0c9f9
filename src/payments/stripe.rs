use crate::config::StripeConfig;
use crate::payments::gate::Gate;
use crate::payments::{
    Donation, DonationAdapter, PaymentError, Provider, ProviderCharge, Redirects, send_json,
};
use serde_json::Value;
use tracing::info;

/// Card payments through a hosted Checkout session.
#[derive(Clone, Debug)]
pub struct StripeAdapter {
    config: StripeConfig,
    redirects: Redirects,
    client: reqwest::Client,
}

impl StripeAdapter {
    pub fn new(config: StripeConfig, redirects: Redirects, client: reqwest::Client) -> Self {
        Self {
            config,
            redirects,
            client,
        }
    }

    fn form(&self, donation: &Donation, unit_amount: i64) -> Vec<(&'static str, String)> {
        let product = match &donation.project_id {
            Some(id) => format!("Donation for Project {id}"),
            None => "General Donation".to_string(),
        };
        vec![
            ("payment_method_types[0]", "card".to_string()),
            ("line_items[0][price_data][currency]", donation.currency.to_ascii_lowercase()),
            ("line_items[0][price_data][product_data][name]", product),
            ("line_items[0][price_data][unit_amount]", unit_amount.to_string()),
            ("line_items[0][quantity]", "1".to_string()),
            ("mode", "payment".to_string()),
            ("success_url", self.redirects.success.clone()),
            ("cancel_url", self.redirects.cancel.clone()),
            ("metadata[projectId]", donation.project_ref().to_string()),
        ]
    }
}

impl DonationAdapter for StripeAdapter {
    const PROVIDER: Provider = Provider::Stripe;
    const REQUIRES_EMAIL: bool = false;
    const DEFAULT_CURRENCY: &'static str = "usd";

    fn is_enabled(&self) -> bool {
        self.config.is_enabled()
    }

    async fn create_charge(&self, donation: &Donation) -> Result<ProviderCharge, PaymentError> {
        let unit_amount = donation.minor_units()?;
        let secret = self.config.secret_key.as_deref().unwrap_or_default();
        let url = format!("{}/v1/checkout/sessions", self.config.api_base.trim_end_matches('/'));

        let request = self
            .client
            .post(url)
            .bearer_auth(secret)
            .form(&self.form(donation, unit_amount));
        let body = send_json(Provider::Stripe, request).await?;

        let id = body
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| PaymentError::Provider {
                provider: Provider::Stripe,
                status: None,
                message: "Stripe did not return a session id".to_string(),
            })?;
        info!(session = id, project = donation.project_ref(), "checkout session created");
        Ok(ProviderCharge::Session { id: id.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payments::{DonationRequest, initiate};
    use rust_decimal::Decimal;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn adapter(server: &MockServer, secret: Option<&str>) -> StripeAdapter {
        StripeAdapter::new(
            StripeConfig {
                secret_key: secret.map(ToString::to_string),
                enabled: None,
                api_base: server.uri(),
            },
            Redirects {
                success: "http://localhost:5173/donate/success".to_string(),
                cancel: "http://localhost:5173/donate/cancel".to_string(),
            },
            reqwest::Client::new(),
        )
    }

    fn donation(amount: i64, project: Option<&str>) -> DonationRequest {
        DonationRequest {
            amount: Some(Decimal::from(amount)),
            project_id: project.map(ToString::to_string),
            ..DonationRequest::default()
        }
    }

    #[tokio::test]
    async fn creates_session_in_cents() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/checkout/sessions"))
            .and(header("authorization", "Bearer sk_test_51Hreal"))
            .and(body_string_contains("unit_amount%5D=5000"))
            .and(body_string_contains("metadata%5BprojectId%5D=abc"))
            .and(body_string_contains("mode=payment"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "cs_test_1", "object": "checkout.session"})))
            .expect(1)
            .mount(&server)
            .await;

        let charge = initiate(&adapter(&server, Some("sk_test_51Hreal")), &donation(50, Some("abc")))
            .await
            .unwrap();
        assert_eq!(charge, ProviderCharge::Session { id: "cs_test_1".to_string() });
    }

    #[tokio::test]
    async fn general_donation_when_no_project() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("General+Donation"))
            .and(body_string_contains("metadata%5BprojectId%5D=general"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "cs_general"})))
            .expect(1)
            .mount(&server)
            .await;

        let charge = initiate(&adapter(&server, Some("sk_live_abc")), &donation(5, None))
            .await
            .unwrap();
        assert_eq!(charge, ProviderCharge::Session { id: "cs_general".to_string() });
    }

    #[tokio::test]
    async fn placeholder_key_makes_no_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = initiate(&adapter(&server, Some("sk_test_placeholder")), &donation(50, None))
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::NotConfigured(Provider::Stripe)));
    }

    #[tokio::test]
    async fn invalid_amount_makes_no_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let adapter = adapter(&server, Some("sk_live_abc"));
        for amount in [0, -10] {
            let err = initiate(&adapter, &donation(amount, None)).await.unwrap_err();
            assert_eq!(err.to_string(), "Invalid amount");
        }
    }

    #[tokio::test]
    async fn surfaces_stripe_error_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({"error": {"message": "Invalid API Key provided"}})),
            )
            .mount(&server)
            .await;

        let err = initiate(&adapter(&server, Some("sk_live_revoked")), &donation(10, None))
            .await
            .unwrap_err();
        match err {
            PaymentError::Provider { status, message, .. } => {
                assert_eq!(status, Some(401));
                assert_eq!(message, "Invalid API Key provided");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
