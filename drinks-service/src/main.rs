use anyhow::Context;
use common_auth::AuthGate;
use drinks_service::{build_router, repo, AppState, ServiceConfig, SERVICE_NAME};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServiceConfig::from_env()?;
    let db = repo::connect(&config.database_url)
        .await
        .with_context(|| format!("Failed to open database {}", config.database_url))?;
    if config.reset_on_start {
        let seeded = repo::reset_and_seed(&db).await?;
        info!(drink_id = seeded.id, "drinks table reset and seeded");
    }

    info!(
        issuer = %config.auth.issuer(),
        audience = %config.auth.audience,
        jwks_url = %config.auth.jwks_url(),
        "auth configured"
    );
    let gate = AuthGate::new(config.auth.clone()).context("Failed to initialise authorization")?;
    let cors = config.cors_layer()?;
    let app = build_router(AppState::new(db, gate)).layer(cors);

    let addr = config.bind_addr();
    info!(%addr, "starting {SERVICE_NAME}");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
