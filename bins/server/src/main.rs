//! Spendbee API Server
//!
//! Main entry point for the Spendbee backend service.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use spendbee_api::{AppState, create_router};
use spendbee_core::currency::{EcbRateSource, ExchangeRateProvider};
use spendbee_db::connect;
use spendbee_shared::{AppConfig, JwtConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "spendbee=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = connect(
        &config.database.url,
        config.database.max_connections,
        config.database.min_connections,
    )
    .await?;
    info!("Connected to database");

    let jwt_service = JwtService::new(JwtConfig {
        secret: config.jwt.secret.clone(),
        #[allow(clippy::cast_possible_wrap)]
        token_expires_days: (config.jwt.token_expiry_secs / 86_400).max(1) as i64,
    });

    let rates = &config.exchange_rates;
    let source = EcbRateSource::new(
        rates.source_url.clone(),
        Duration::from_secs(rates.request_timeout_secs),
    )?;
    #[allow(clippy::cast_possible_wrap)]
    let refresh_interval = chrono::Duration::seconds(rates.refresh_interval_secs as i64);
    info!(
        source = %source.url(),
        refresh_secs = rates.refresh_interval_secs,
        "Exchange rate provider configured"
    );
    let provider = ExchangeRateProvider::new(Box::new(source), refresh_interval);

    let state = AppState {
        db: Arc::new(db),
        jwt_service: Arc::new(jwt_service),
        rates: Arc::new(provider),
        secure_cookie: config.jwt.secure_cookie,
        public_url: Arc::from(config.app.public_url.as_str()),
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
