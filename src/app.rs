use axum::extract::DefaultBodyLimit;
use sqlx::PgPool;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::{create_router, AppState};
use crate::config::Config;
use crate::inspection::InspectionExtractor;
use crate::services::InspectionImportService;

/// Running application: the HTTP server accepting inspection uploads
pub struct Application {
    pub server_handle: JoinHandle<Result<(), std::io::Error>>,
}

impl Application {
    /// Build services from configuration and spawn the HTTP server
    pub async fn build(config: Config, pool: PgPool) -> Result<Self, Box<dyn std::error::Error>> {
        info!("Initializing application components");

        let catalog = config.measurement_catalog()?;
        info!(
            "Loaded measurement catalog with {} fields{}",
            catalog.len(),
            config
                .measurement_catalog_path
                .as_ref()
                .map(|p| format!(" from {}", p.display()))
                .unwrap_or_default()
        );

        let extractor = InspectionExtractor::new(catalog);
        let import_service = InspectionImportService::new(pool, extractor);

        let app_state = AppState { import_service };
        let app = create_router(app_state)
            .layer(DefaultBodyLimit::max(config.max_upload_bytes))
            .layer(TraceLayer::new_for_http());

        let addr = config.server_addr();
        info!("Starting HTTP server on {}", addr);

        let server_handle = tokio::spawn(async move {
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            axum::serve(listener, app).await
        });

        info!("Application initialized successfully");
        Ok(Self { server_handle })
    }

    pub async fn run_until_stopped(self) -> Result<(), Box<dyn std::error::Error>> {
        self.server_handle.await??;
        Ok(())
    }
}
