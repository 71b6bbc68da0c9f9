use clap::Parser;
use eyre::WrapErr;
use foundation_server::config::Config;
use foundation_server::db::Database;
use foundation_server::payments::availability;
use foundation_server::{AppState, app};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(version, about = "Foundation content and donation API")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "FOUNDATION_CONFIG", default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(sentry::integrations::tracing::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "info,{}=debug,hyper_util=debug,axum_serve=debug",
                    env!("CARGO_CRATE_NAME")
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::load_with_env(&cli.config).wrap_err("Failed to load config")?;

    let _sentry = config.telemetry.sentry_dsn.as_deref().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                environment: Some(format!("{:?}", config.server.environment).to_lowercase().into()),
                traces_sample_rate: 1.0,
                ..Default::default()
            },
        ))
    });

    for (provider, enabled) in availability::report(&config.payments) {
        if enabled {
            tracing::info!(%provider, "donation provider enabled");
        } else {
            tracing::warn!(%provider, "donation provider not configured");
        }
    }

    let db = Database::open(&config.storage.database)
        .wrap_err_with(|| format!("Failed to open database {}", config.storage.database))?;
    let addr = config.server.to_socket_addrs();
    let state = AppState::new(config, db).wrap_err("Failed to build HTTP client")?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .wrap_err_with(|| format!("Failed to bind {addr}"))?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("received CTRL+C, shutting down");
            }
        })
        .await
        .wrap_err("HTTP server failed")?;
    Ok(())
}
