use std::env;
use std::path::PathBuf;

use crate::inspection::{CatalogError, MeasurementCatalog};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub database_max_connections: u32,
    pub max_upload_bytes: usize,
    pub measurement_catalog_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Config {
            database_url: env::var("DATABASE_URL")?,
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap_or(5),
            max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                .unwrap_or_else(|_| "10485760".to_string())
                .parse()
                .unwrap_or(10 * 1024 * 1024),
            measurement_catalog_path: env::var("MEASUREMENT_CATALOG_PATH")
                .ok()
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from),
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// Measurement catalog from `MEASUREMENT_CATALOG_PATH`, or the default table
    pub fn measurement_catalog(&self) -> Result<MeasurementCatalog, CatalogError> {
        MeasurementCatalog::load(self.measurement_catalog_path.as_deref())
    }
}
