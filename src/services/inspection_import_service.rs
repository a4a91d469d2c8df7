use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use std::time::Instant;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use crate::db::{DbError, InspectionRecordRepository};
use crate::inspection::{GridError, InspectionExtractor, InspectionRecord};

/// Error types for inspection file imports
#[derive(Debug, thiserror::Error)]
pub enum InspectionImportError {
    #[error("Parse failed: {0}")]
    Parse(#[from] GridError),

    #[error(transparent)]
    Database(#[from] DbError),

    #[error("Extraction task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Result of importing one file
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ImportOutcome {
    pub filename: String,
    pub records_parsed: usize,
    pub records_inserted: u64,
    pub duration_secs: f64,
    pub imported_at: DateTime<Utc>,
}

impl ImportOutcome {
    /// True when the file held no measurable records (nothing was stored)
    pub fn is_empty(&self) -> bool {
        self.records_parsed == 0
    }

    pub fn message(&self) -> String {
        if self.is_empty() {
            format!("No measurable records found in {}", self.filename)
        } else {
            format!(
                "Successfully inserted {} records from {}",
                self.records_inserted, self.filename
            )
        }
    }
}

/// Extracts inspection records from uploaded files and stores them
#[derive(Clone)]
pub struct InspectionImportService {
    extractor: InspectionExtractor,
    record_repo: InspectionRecordRepository,
}

impl InspectionImportService {
    pub fn new(pool: PgPool, extractor: InspectionExtractor) -> Self {
        Self {
            extractor,
            record_repo: InspectionRecordRepository::new(pool),
        }
    }

    /// Import one inspection report
    ///
    /// 1. Loads the grid and extracts records (on the blocking pool)
    /// 2. Returns early, storing nothing, when no record has measured data
    /// 3. Inserts all records in one transaction
    #[instrument(skip(self, content), fields(filename = %filename, bytes = content.len()))]
    pub async fn import_file(
        &self,
        filename: &str,
        content: Vec<u8>,
    ) -> Result<ImportOutcome, InspectionImportError> {
        let start_time = Instant::now();

        let records = self.extract(filename, content).await?;
        info!("Parsed {} records from file: {}", records.len(), filename);

        let records_inserted = if records.is_empty() {
            info!("No valid inspection records with measurable data in {}", filename);
            0
        } else {
            self.record_repo.insert_records(&records).await.map_err(|e| {
                warn!("Failed to store records from {}: {}", filename, e);
                e
            })?
        };

        let outcome = ImportOutcome {
            filename: filename.to_string(),
            records_parsed: records.len(),
            records_inserted,
            duration_secs: start_time.elapsed().as_secs_f64(),
            imported_at: Utc::now(),
        };

        info!(
            "✓ Import complete for {} ({:.3}s, {} records)",
            filename, outcome.duration_secs, outcome.records_inserted
        );
        Ok(outcome)
    }

    /// Extract records without storing them
    #[instrument(skip(self, content), fields(filename = %filename, bytes = content.len()))]
    pub async fn preview_file(
        &self,
        filename: &str,
        content: Vec<u8>,
    ) -> Result<Vec<InspectionRecord>, InspectionImportError> {
        self.extract(filename, content).await
    }

    /// Grid parsing is synchronous (calamine, csv), keep it off the runtime
    async fn extract(
        &self,
        filename: &str,
        content: Vec<u8>,
    ) -> Result<Vec<InspectionRecord>, InspectionImportError> {
        let extractor = self.extractor.clone();
        let filename = filename.to_string();

        let records = tokio::task::spawn_blocking(move || {
            extractor.extract_bytes(&filename, &content)
        })
        .await??;

        Ok(records)
    }
}
