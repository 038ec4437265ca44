//! LearnCart backend binary - composition root.
//!
//! Loads and validates configuration, wires adapters to ports, and serves
//! the HTTP API. All process-wide dependencies (gateway client, mail sender,
//! connection pool, lock registry) are constructed here and injected; nothing
//! lives in ambient globals.

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use learncart::adapters::email::{ResendMailer, ResendMailerConfig};
use learncart::adapters::http::payment::{payment_router, PaymentAppState};
use learncart::adapters::paystack::{PaystackConfig, PaystackGateway};
use learncart::adapters::postgres::{
    PostgresAccountStore, PostgresEntitlementLedger, PostgresOrderStore,
};
use learncart::application::handlers::payment::AccountLocks;
use learncart::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.server.log_level.clone()));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if config.is_production() {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    tracing::info!(environment = ?config.server.environment, "starting learncart backend");

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("database migrations applied");
    }

    if config.payment.allow_test_mode {
        tracing::warn!(
            "PAYSTACK TEST MODE ENABLED: gateway verification will be simulated for every request"
        );
    }

    let gateway_config = PaystackConfig::new(config.payment.paystack_secret_key.clone())
        .with_base_url(config.payment.api_base_url.clone())
        .with_request_timeout(Duration::from_secs(config.payment.verify_timeout_secs))
        .with_max_retries(config.payment.verify_retries)
        .with_allow_test_mode(config.payment.allow_test_mode);

    let state = PaymentAppState {
        gateway: Arc::new(PaystackGateway::new(gateway_config)),
        accounts: Arc::new(PostgresAccountStore::new(pool.clone())),
        ledger: Arc::new(PostgresEntitlementLedger::new(pool.clone())),
        orders: Arc::new(PostgresOrderStore::new(pool.clone())),
        notifier: Arc::new(ResendMailer::new(ResendMailerConfig::new(
            config.email.resend_api_key.clone(),
            config.email.from_header(),
        ))),
        account_locks: AccountLocks::new(),
    };

    let app = axum::Router::new()
        .nest("/api", payment_router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(TimeoutLayer::new(Duration::from_secs(
                    config.server.request_timeout_secs,
                ))),
        )
        .with_state(state);

    let addr = config.server.socket_addr();
    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
