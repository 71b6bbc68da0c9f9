pub mod config;
pub mod db;
pub mod error;
pub mod payments;
pub mod report_pdf;
pub mod routes;

use crate::config::Config;
use crate::db::Database;
use crate::payments::DonationGateway;
use axum::Router;
use std::sync::Arc;

/// Everything a handler can reach. Cloned per request, so the heavy parts sit
/// behind `Arc`s.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Database,
    pub gateway: DonationGateway,
}

impl AppState {
    pub fn new(config: Config, db: Database) -> Result<Self, reqwest::Error> {
        let gateway = DonationGateway::from_config(&config)?;
        Ok(Self {
            config: Arc::new(config),
            db,
            gateway,
        })
    }
}

pub fn app(state: AppState) -> Router {
    error::configure(state.config.server.environment);
    routes::router(state)
}
