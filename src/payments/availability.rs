use crate::config::PaymentsConfig;
use crate::payments::Provider;
use crate::payments::gate::Gate;
use std::collections::BTreeMap;

/// Which donation methods the website may offer right now.
pub type Availability = BTreeMap<Provider, bool>;

/// Evaluated on every call; nothing is cached between requests.
pub fn report(config: &PaymentsConfig) -> Availability {
    Provider::ALL
        .into_iter()
        .map(|provider| (provider, is_enabled(config, provider)))
        .collect()
}

pub fn is_enabled(config: &PaymentsConfig, provider: Provider) -> bool {
    match provider {
        Provider::Stripe => config.stripe.is_enabled(),
        Provider::Paystack => config.paystack.is_enabled(),
        Provider::Flutterwave => config.flutterwave.is_enabled(),
        Provider::Coinbase => config.coinbase.is_enabled(),
    }
}
