use crate::config::CoinbaseConfig;
use crate::payments::gate::Gate;
use crate::payments::{
    Donation, DonationAdapter, PaymentError, Provider, ProviderCharge, Redirects, send_json,
};
use serde_json::json;
use tracing::info;

pub const API_VERSION: &str = "2018-03-22";

/// Crypto charges through Coinbase Commerce. Settlement arrives later via
/// the webhook, see [`crate::payments::webhook`].
#[derive(Clone, Debug)]
pub struct CoinbaseAdapter {
    config: CoinbaseConfig,
    redirects: Redirects,
    client: reqwest::Client,
}

impl CoinbaseAdapter {
    pub fn new(config: CoinbaseConfig, redirects: Redirects, client: reqwest::Client) -> Self {
        Self {
            config,
            redirects,
            client,
        }
    }
}

impl DonationAdapter for CoinbaseAdapter {
    const PROVIDER: Provider = Provider::Coinbase;
    const REQUIRES_EMAIL: bool = true;
    const DEFAULT_CURRENCY: &'static str = "USD";

    fn is_enabled(&self) -> bool {
        self.config.is_enabled()
    }

    async fn create_charge(&self, donation: &Donation) -> Result<ProviderCharge, PaymentError> {
        let amount = donation.major_units()?;
        let api_key = self.config.api_key.as_deref().unwrap_or_default();
        let url = format!("{}/charges", self.config.api_base.trim_end_matches('/'));
        let description = match &donation.project_id {
            Some(id) => format!("Donation for Project {id}"),
            None => "General Donation".to_string(),
        };
        let body = json!({
            "name": "Donation",
            "description": description,
            "pricing_type": "fixed_price",
            "local_price": {
                "amount": amount,
                "currency": donation.currency.to_ascii_uppercase(),
            },
            "metadata": {
                "projectId": donation.project_ref(),
                "email": donation.email,
            },
            "redirect_url": self.redirects.success,
            "cancel_url": self.redirects.cancel,
        });

        let request = self
            .client
            .post(url)
            .header("X-CC-Api-Key", api_key)
            .header("X-CC-Version", API_VERSION)
            .json(&body);
        let payload = send_json(Provider::Coinbase, request).await?;
        info!(
            charge = payload.pointer("/data/code").and_then(|c| c.as_str()),
            project = donation.project_ref(),
            "coinbase charge created"
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
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn adapter(server: &MockServer) -> CoinbaseAdapter {
        CoinbaseAdapter::new(
            CoinbaseConfig {
                api_key: Some("cb-live-key".to_string()),
                webhook_secret: None,
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

    #[tokio::test]
    async fn creates_fixed_price_charge() {
        let server = MockServer::start().await;
        let reply = json!({"data": {"code": "ABCD1234", "hosted_url": "https://commerce.coinbase.com/charges/ABCD1234"}});
        Mock::given(method("POST"))
            .and(path("/charges"))
            .and(header("X-CC-Api-Key", "cb-live-key"))
            .and(header("X-CC-Version", API_VERSION))
            .and(body_partial_json(json!({
                "pricing_type": "fixed_price",
                "local_price": {"amount": "12.35", "currency": "USD"},
                "metadata": {"projectId": "wells", "email": "d@site.org"},
                "cancel_url": "https://site.org/donate/cancel"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(reply.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let request = DonationRequest {
            amount: Some(Decimal::from_str("12.345").unwrap()),
            project_id: Some("wells".to_string()),
            email: Some("d@site.org".to_string()),
            ..DonationRequest::default()
        };
        let charge = initiate(&adapter(&server), &request).await.unwrap();
        assert_eq!(charge, ProviderCharge::Raw(reply));
    }

    #[tokio::test]
    async fn provider_outage_is_a_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let request = DonationRequest {
            amount: Some(Decimal::from(1)),
            email: Some("d@site.org".to_string()),
            ..DonationRequest::default()
        };
        let err = initiate(&adapter(&server), &request).await.unwrap_err();
        assert!(matches!(
            err,
            PaymentError::Provider { provider: Provider::Coinbase, status: Some(503), .. }
        ));
    }

    #[tokio::test]
    async fn non_positive_and_dust_amounts_make_no_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let adapter = adapter(&server);
        for amount in ["0", "-3", "0.001"] {
            let request = DonationRequest {
                amount: Some(Decimal::from_str(amount).unwrap()),
                email: Some("d@site.org".to_string()),
                ..DonationRequest::default()
            };
            let err = initiate(&adapter, &request).await.unwrap_err();
            assert!(matches!(err, PaymentError::Validation(_)), "amount {amount}");
            assert_eq!(err.to_string(), "Invalid amount");
        }
    }
}
