use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use showbill::config::AppConfig;
use showbill::{router, AppContext, Store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load();

    // Fail fast if the database cannot be opened; this also creates the
    // schema before the first request arrives.
    Store::open(&config.database_path)?;

    let app = router(AppContext {
        database_path: config.database_path.clone(),
    });

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, db = ?config.database_path, "showbill listening");
    axum::serve(listener, app).await?;
    Ok(())
}
