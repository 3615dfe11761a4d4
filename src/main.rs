use anyhow::{Context, Result};
use portfolio_server::config::Config;
use portfolio_server::http::{self, AppState};
use portfolio_server::logging;
use portfolio_server::mailer::{LogMailer, Mailer, SmtpMailer};
use portfolio_server::store::{MemoryStore, PgStore, Store};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (absent in production)
    let _ = dotenvy::dotenv();

    let config = Config::from_env()?;
    logging::init(config.environment)?;

    info!("Starting portfolio server ({})", config.environment);

    if std::env::var("MONGODB_URI").is_ok_and(|v| !v.trim().is_empty()) {
        warn!("MONGODB_URI is set but MongoDB is not supported; use DATABASE_URL (PostgreSQL)");
    }

    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => Arc::new(PgStore::connect(url).await?),
        None => {
            warn!("DATABASE_URL not set; using in-memory store (data is lost on restart)");
            Arc::new(MemoryStore::new())
        }
    };

    let mailer: Arc<dyn Mailer> = match &config.smtp {
        Some(smtp) => {
            info!("Sending email through {}:{}", smtp.host, smtp.port);
            Arc::new(SmtpMailer::new(smtp).context("invalid SMTP configuration")?)
        }
        None => {
            warn!("SMTP not configured; emails will only be logged");
            Arc::new(LogMailer)
        }
    };

    if config.admin_key.is_none() {
        warn!("ADMIN_KEY not set; admin routes will reject every request");
    }

    let addr = format!("0.0.0.0:{}", config.port);
    let app = http::router(AppState::new(config, store, mailer));

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
