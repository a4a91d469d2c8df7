use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use tracing::{debug, error, info, instrument};

use crate::db::DbError;
use crate::inspection::record::{column_union, InspectionRecord};

pub const TABLE_NAME: &str = "inspection_records";

/// Postgres limit on bind parameters in a single statement
const MAX_BIND_PARAMS: usize = 65_535;

/// A stored record, with only its non-null columns
#[derive(Debug, Clone, Serialize)]
pub struct StoredInspectionRecord {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub fields: serde_json::Map<String, JsonValue>,
}

#[derive(Clone)]
pub struct InspectionRecordRepository {
    pool: PgPool,
}

impl InspectionRecordRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert all records extracted from one file in a single transaction
    ///
    /// The column list is the sorted union of fields across the batch;
    /// records missing a column get NULL. Either every record is committed
    /// or none is. An empty batch touches nothing.
    #[instrument(skip(self, records), fields(count = records.len()))]
    pub async fn insert_records(&self, records: &[InspectionRecord]) -> Result<u64, DbError> {
        if records.is_empty() {
            debug!("No records to insert");
            return Ok(0);
        }

        let columns = column_union(records);
        if let Some(bad) = columns.iter().find(|c| !is_safe_identifier(c)) {
            return Err(DbError::InvalidColumn(bad.to_string()));
        }

        let rows_per_statement = (MAX_BIND_PARAMS / columns.len()).max(1);
        debug!(
            "Beginning transaction to insert {} records across {} columns",
            records.len(),
            columns.len()
        );

        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;

        for chunk in records.chunks(rows_per_statement) {
            let mut query = build_insert_query(&columns, chunk);
            let result = query.build().execute(&mut *tx).await.map_err(|e| {
                error!("Failed to insert inspection records: {}", e);
                e
            })?;
            inserted += result.rows_affected();
        }

        tx.commit().await?;
        info!("Inserted {} inspection records", inserted);
        Ok(inserted)
    }

    #[instrument(skip(self))]
    pub async fn count_by_filename(&self, filename: &str) -> Result<i64, DbError> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"SELECT COUNT(*) FROM inspection_records WHERE "filename" = $1"#,
        )
        .bind(filename)
        .fetch_one(&self.pool)
        .await?;

        debug!("Found {} records for {}", count, filename);
        Ok(count)
    }

    /// Stored records for a file, in insertion order
    #[instrument(skip(self))]
    pub async fn find_by_filename(
        &self,
        filename: &str,
    ) -> Result<Vec<StoredInspectionRecord>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT r.id, r.created_at,
                   jsonb_strip_nulls(to_jsonb(r) - 'id' - 'created_at') AS fields
            FROM inspection_records r
            WHERE r."filename" = $1
            ORDER BY r.id
            "#,
        )
        .bind(filename)
        .fetch_all(&self.pool)
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let fields = match row.try_get::<JsonValue, _>("fields")? {
                JsonValue::Object(map) => map,
                _ => serde_json::Map::new(),
            };
            records.push(StoredInspectionRecord {
                id: row.try_get("id")?,
                created_at: row.try_get("created_at")?,
                fields,
            });
        }

        debug!("Found {} stored records for {}", records.len(), filename);
        Ok(records)
    }
}

/// Multi-row INSERT for one chunk; every record binds every column
fn build_insert_query<'a>(
    columns: &[&str],
    records: &'a [InspectionRecord],
) -> QueryBuilder<'a, Postgres> {
    let mut query = QueryBuilder::new(format!("INSERT INTO {TABLE_NAME} ("));
    let mut column_list = query.separated(", ");
    for column in columns {
        column_list.push(format!("\"{column}\""));
    }
    query.push(") ");

    query.push_values(records, |mut row, record| {
        for column in columns {
            row.push_bind(record.value(column).map(str::to_owned));
        }
    });
    query
}

fn is_safe_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
