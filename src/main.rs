use backon::{ExponentialBuilder, Retryable};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tracing::{info, instrument, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use inspection_record_service::app::Application;
use inspection_record_service::config::Config;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing with environment filter support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,inspection_record_service=debug")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true),
        )
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env().map_err(|e| {
        warn!("DATABASE_URL must be set (environment or .env)");
        e
    })?;
    info!(
        "Starting inspection record service on {}",
        config.server_addr()
    );

    // The database may still be starting when the service comes up
    info!("Connecting to database...");
    let database_url = config.database_url.as_str();
    let max_connections = config.database_max_connections;
    let pool = (move || connect(database_url, max_connections))
        .retry(
            ExponentialBuilder::default()
                .with_min_delay(Duration::from_secs(1))
                .with_max_delay(Duration::from_secs(30))
                .with_max_times(5),
        )
        .notify(|err: &sqlx::Error, delay: Duration| {
            warn!("Database connection failed ({}), retrying in {:?}", err, delay);
        })
        .await?;
    info!("Database connection established");

    info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database migrations completed");

    let app = Application::build(config, pool).await?;
    app.run_until_stopped().await
}

async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}
