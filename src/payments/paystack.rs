use crate::config::PaystackConfig;
use crate::payments::gate::Gate;
use crate::payments::{
    Donation, DonationAdapter, PaymentError, Provider, ProviderCharge, Redirects, send_json,
};
use serde_json::json;
use tracing::info;

/// Regional card/bank gateway; amounts go out in kobo.
#[derive(Clone, Debug)]
pub struct PaystackAdapter {
    config: PaystackConfig,
    redirects: Redirects,
    client: reqwest::Client,
}

impl PaystackAdapter {
    pub fn new(config: PaystackConfig, redirects: Redirects, client: reqwest::Client) -> Self {
        Self {
            config,
            redirects,
            client,
        }
    }
}

impl DonationAdapter for PaystackAdapter {
    const PROVIDER: Provider = Provider::Paystack;
    const REQUIRES_EMAIL: bool = true;
    const DEFAULT_CURRENCY: &'static str = "NGN";

    fn is_enabled(&self) -> bool {
        self.config.is_enabled()
    }

    async fn create_charge(&self, donation: &Donation) -> Result<ProviderCharge, PaymentError> {
        let amount = donation.minor_units()?;
        let secret = self.config.secret_key.as_deref().unwrap_or_default();
        let url = format!(
            "{}/transaction/initialize",
            self.config.api_base.trim_end_matches('/')
        );
        let body = json!({
            "email": donation.email,
            "amount": amount,
            "currency": donation.currency.to_ascii_uppercase(),
            "callback_url": self.redirects.success,
            "metadata": {
                "projectId": donation.project_ref(),
                "cancel_action": self.redirects.cancel,
            },
        });

        let request = self.client.post(url).bearer_auth(secret).json(&body);
        let payload = send_json(Provider::Paystack, request).await?;
        info!(
            reference = payload.pointer("/data/reference").and_then(|r| r.as_str()),
            project = donation.project_ref(),
            "paystack transaction initialized"
        );
        Ok(ProviderCharge::Raw(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payments::{DonationRequest, initiate};
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn adapter(server: &MockServer, secret: &str) -> PaystackAdapter {
        PaystackAdapter::new(
            PaystackConfig {
                secret_key: Some(secret.to_string()),
                enabled: None,
                api_base: server.uri(),
            },
            Redirects {
                success: "https://site.org/donate/success".to_string(),
                cancel: "https://site.org/donate/cancel".to_string(),
            },
            reqwest::Client::new(),
        )
    }

    fn request(amount: &str, email: Option<&str>) -> DonationRequest {
        DonationRequest {
            amount: Some(Decimal::from_str(amount).unwrap()),
            project_id: Some("p1".to_string()),
            email: email.map(ToString::to_string),
            ..DonationRequest::default()
        }
    }

    #[tokio::test]
    async fn relays_init_payload_and_sends_kobo() {
        let server = MockServer::start().await;
        let reply = json!({
            "status": true,
            "message": "Authorization URL created",
            "data": {"authorization_url": "https://checkout.paystack.com/abc", "access_code": "abc", "reference": "ref1"}
        });
        Mock::given(method("POST"))
            .and(path("/transaction/initialize"))
            .and(header("authorization", "Bearer sk_live_pay"))
            .and(body_partial_json(json!({
                "email": "donor@site.org",
                "amount": 1050,
                "currency": "NGN",
                "callback_url": "https://site.org/donate/success",
                "metadata": {"projectId": "p1"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let charge = initiate(&adapter(&server, "sk_live_pay"), &request("10.50", Some("donor@site.org")))
            .await
            .unwrap();
        assert_eq!(charge, ProviderCharge::Raw(reply));
    }

    #[tokio::test]
    async fn email_is_required_before_any_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = initiate(&adapter(&server, "sk_live_pay"), &request("10", None))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Email is required");
    }

    #[tokio::test]
    async fn provider_rejection_carries_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(json!({"status": false, "message": "Invalid Email Address Passed"})),
            )
            .mount(&server)
            .await;

        let err = initiate(&adapter(&server, "sk_live_pay"), &request("10", Some("x@y")))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid Email Address Passed");
    }

    #[tokio::test]
    async fn non_positive_and_dust_amounts_make_no_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let adapter = adapter(&server, "sk_live_pay");
        for amount in ["0", "-10", "0.004"] {
            let err = initiate(&adapter, &request(amount, Some("donor@site.org")))
                .await
                .unwrap_err();
            assert_eq!(err.to_string(), "Invalid amount", "amount {amount}");
        }
    }

    #[tokio::test]
    async fn slow_provider_times_out_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"status": true}))
                    .set_delay(Duration::from_millis(500)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(50))
            .build()
            .unwrap();
        let adapter = PaystackAdapter::new(
            PaystackConfig {
                secret_key: Some("sk_live_pay".to_string()),
                enabled: None,
                api_base: server.uri(),
            },
            Redirects {
                success: "https://site.org/donate/success".to_string(),
                cancel: "https://site.org/donate/cancel".to_string(),
            },
            client,
        );

        let err = initiate(&adapter, &request("10", Some("donor@site.org")))
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::Timeout { provider: Provider::Paystack }));
    }
}
