use anyhow::Context as _;
use sea_orm::Database;
use tracing::info;

use talaro_core::config::Config;
use talaro_core::tracing::init_tracing;
use talaro_recovery::config::RecoveryConfig;
use talaro_recovery::router::build_router;
use talaro_recovery::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = RecoveryConfig::from_env()?;
    let policy = config.policy()?;

    let db = Database::connect(&config.database_url)
        .await
        .context("failed to connect to database")?;

    let state = AppState {
        db,
        policy,
        product_name: config.product_name.clone(),
        delivery_timeout: config.delivery_timeout(),
    };

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.recovery_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(
        ttl_secs = config.otp_ttl_secs,
        max_attempts = config.otp_max_attempts,
        "recovery service listening on {addr}"
    );
    axum::serve(listener, router).await.context("server error")?;
    Ok(())
}
