use eyre::{Context, Report, eyre};
use serde_derive::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;
use url::Url;

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub telemetry: TelemetryConfig,
    pub payments: PaymentsConfig,
    pub report: ReportConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: Ipv4Addr,
    pub port: u16,
    pub environment: Environment,
    /// Origins allowed to call the API from a browser. Empty allows any origin.
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: Ipv4Addr::UNSPECIFIED,
            port: 5000,
            environment: Environment::Development,
            allowed_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn to_socket_addrs(&self) -> SocketAddr {
        SocketAddr::new(self.host.into(), self.port)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

impl From<&str> for Environment {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub database: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: "foundation.db".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct TelemetryConfig {
    pub sentry_dsn: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ReportConfig {
    pub organisation: String,
    pub tagline: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            organisation: "Muikat Atoke Abati Foundation".to_string(),
            tagline: "Empowering Nigerian Communities".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct PaymentsConfig {
    /// Base URL of the website; donors are redirected back under `/donate/...`.
    pub frontend_url: String,
    pub provider_timeout_secs: u64,
    pub stripe: StripeConfig,
    pub paystack: PaystackConfig,
    pub flutterwave: FlutterwaveConfig,
    pub coinbase: CoinbaseConfig,
}

impl Default for PaymentsConfig {
    fn default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            provider_timeout_secs: 15,
            stripe: StripeConfig::default(),
            paystack: PaystackConfig::default(),
            flutterwave: FlutterwaveConfig::default(),
            coinbase: CoinbaseConfig::default(),
        }
    }
}

impl PaymentsConfig {
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    pub fn success_url(&self) -> String {
        format!("{}/donate/success", self.frontend_url.trim_end_matches('/'))
    }

    pub fn cancel_url(&self) -> String {
        format!("{}/donate/cancel", self.frontend_url.trim_end_matches('/'))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct StripeConfig {
    pub secret_key: Option<String>,
    pub enabled: Option<bool>,
    pub api_base: String,
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            enabled: None,
            api_base: "https://api.stripe.com".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct PaystackConfig {
    pub secret_key: Option<String>,
    pub enabled: Option<bool>,
    pub api_base: String,
}

impl Default for PaystackConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            enabled: None,
            api_base: "https://api.paystack.co".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct FlutterwaveConfig {
    pub secret_key: Option<String>,
    pub enabled: Option<bool>,
    pub api_base: String,
}

impl Default for FlutterwaveConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            enabled: None,
            api_base: "https://api.flutterwave.com".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct CoinbaseConfig {
    pub api_key: Option<String>,
    pub webhook_secret: Option<String>,
    pub enabled: Option<bool>,
    pub api_base: String,
}

impl Default for CoinbaseConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            webhook_secret: None,
            enabled: None,
            api_base: "https://api.commerce.coinbase.com".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Report> {
        let config = std::fs::read_to_string(path)?;
        toml::from_str(&config).wrap_err("Failed to parse config")
    }

    /// Reads the file when it exists, then lets the process environment override it.
    pub fn load_with_env(path: impl AsRef<Path>) -> Result<Self, Report> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            Self::load(path).wrap_err_with(|| format!("Failed to load {}", path.display()))?
        } else {
            tracing::warn!("{} not found, using defaults", path.display());
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Overlays environment values on top of the file. `lookup` is injected so
    /// tests don't have to mutate the real process environment.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(port) = lookup("PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
        if let Some(env) = lookup("APP_ENV") {
            self.server.environment = Environment::from(env.as_str());
        }
        if let Some(origins) = lookup("ALLOWED_ORIGINS") {
            self.server.allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(ToString::to_string)
                .collect();
        }
        if let Some(db) = lookup("DATABASE_URL") {
            self.storage.database = db;
        }
        if let Some(dsn) = lookup("SENTRY_DSN") {
            self.telemetry.sentry_dsn = Some(dsn);
        }
        if let Some(url) = lookup("FRONTEND_URL") {
            self.payments.frontend_url = url;
        }
        if let Some(key) = lookup("STRIPE_SECRET_KEY") {
            self.payments.stripe.secret_key = Some(key);
        }
        if let Some(key) = lookup("PAYSTACK_SECRET_KEY") {
            self.payments.paystack.secret_key = Some(key);
        }
        if let Some(key) = lookup("FLUTTERWAVE_SECRET_KEY") {
            self.payments.flutterwave.secret_key = Some(key);
        }
        if let Some(key) = lookup("COINBASE_COMMERCE_API_KEY") {
            self.payments.coinbase.api_key = Some(key);
        }
        if let Some(secret) = lookup("COINBASE_COMMERCE_WEBHOOK_SECRET") {
            self.payments.coinbase.webhook_secret = Some(secret);
        }
    }

    pub fn validate(&self) -> Result<(), Report> {
        let urls = [
            ("payments.frontend_url", &self.payments.frontend_url),
            ("payments.stripe.api_base", &self.payments.stripe.api_base),
            ("payments.paystack.api_base", &self.payments.paystack.api_base),
            ("payments.flutterwave.api_base", &self.payments.flutterwave.api_base),
            ("payments.coinbase.api_base", &self.payments.coinbase.api_base),
        ];
        for (name, value) in urls {
            Url::parse(value).wrap_err_with(|| format!("{name} is not a valid URL"))?;
        }
        if self.payments.provider_timeout_secs == 0 {
            return Err(eyre!("payments.provider_timeout_secs must be greater than 0"));
        }
        Ok(())
    }
}
