use crate::config::FlutterwaveConfig;
use crate::payments::gate::Gate;
use crate::payments::{
    Donation, DonationAdapter, PaymentError, Provider, ProviderCharge, Redirects, send_json,
};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

/// Regional gateway taking major units and a caller-chosen `tx_ref`.
#[derive(Clone, Debug)]
pub struct FlutterwaveAdapter {
    config: FlutterwaveConfig,
    redirects: Redirects,
    client: reqwest::Client,
}

impl FlutterwaveAdapter {
    pub fn new(config: FlutterwaveConfig, redirects: Redirects, client: reqwest::Client) -> Self {
        Self {
            config,
            redirects,
            client,
        }
    }
}

impl DonationAdapter for FlutterwaveAdapter {
    const PROVIDER: Provider = Provider::Flutterwave;
    const REQUIRES_EMAIL: bool = true;
    const DEFAULT_CURRENCY: &'static str = "NGN";

    fn is_enabled(&self) -> bool {
        self.config.is_enabled()
    }

    async fn create_charge(&self, donation: &Donation) -> Result<ProviderCharge, PaymentError> {
        let amount = donation.major_units()?;
        let secret = self.config.secret_key.as_deref().unwrap_or_default();
        let url = format!("{}/v3/payments", self.config.api_base.trim_end_matches('/'));
        let tx_ref = format!("donation-{}", Uuid::new_v4());
        let body = json!({
            "tx_ref": tx_ref,
            "amount": amount,
            "currency": donation.currency.to_ascii_uppercase(),
            "redirect_url": self.redirects.success,
            "customer": {
                "email": donation.email,
                "phonenumber": donation.phone_number,
            },
            "meta": {
                "projectId": donation.project_ref(),
            },
            "customizations": {
                "title": "Donation",
            },
        });

        let request = self.client.post(url).bearer_auth(secret).json(&body);
        let payload = send_json(Provider::Flutterwave, request).await?;
        info!(%tx_ref, project = donation.project_ref(), "flutterwave payment initialized");
        Ok(ProviderCharge::Raw(payload))
    }
}
