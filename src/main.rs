//! Billing Bridge API server.

use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use http::HeaderName;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use billing_bridge::adapters::http::{billing_router, BillingAppState};
use billing_bridge::adapters::postgres::{
    PostgresChargeRepository, PostgresCustomerRepository, PostgresInvoiceRepository,
    PostgresSubscriptionRepository, MIGRATOR,
};
use billing_bridge::adapters::{AsaasConfig, AsaasGatewayAdapter};
use billing_bridge::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!("Starting Billing Bridge v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load().context("loading configuration")?;
    config.validate().context("validating configuration")?;
    tracing::info!("Configuration loaded");

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await
        .context("connecting to database")?;
    tracing::info!("Database connection established");

    if config.database.run_migrations {
        MIGRATOR.run(&pool).await.context("running migrations")?;
        tracing::info!("Database migrations applied");
    }

    let gateway = AsaasGatewayAdapter::new(
        AsaasConfig::new(config.gateway.api_key.clone())
            .with_base_url(config.gateway.api_url.clone())
            .with_timeout(config.gateway.timeout()),
    )
    .context("building gateway client")?;

    let state = BillingAppState::new(
        Arc::new(PostgresCustomerRepository::new(pool.clone())),
        Arc::new(PostgresChargeRepository::new(pool.clone())),
        Arc::new(PostgresSubscriptionRepository::new(pool.clone())),
        Arc::new(PostgresInvoiceRepository::new(pool)),
        Arc::new(gateway),
        config.fiscal.defaults(),
        config.gateway.webhook_token.clone(),
    );

    let request_id = HeaderName::from_static("x-request-id");
    let app = billing_router().with_state(state).layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::new(request_id))
            .layer(TimeoutLayer::new(config.server.request_timeout())),
    );

    let addr = config.server.socket_addr()?;
    tracing::info!(%addr, "Listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// `RUST_LOG` overrides the default filter; `BILLING_LOG_JSON=1` switches to
/// JSON lines.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,billing_bridge=debug".into());
    let json = std::env::var("BILLING_LOG_JSON").is_ok_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
