use std::sync::Arc;
use tracing::{debug, instrument};

use super::anchor_index::AnchorIndex;
use super::catalog::MeasurementCatalog;
use super::grid::{Grid, GridError};
use super::header::HeaderInfo;
use super::measurement::MeasurementRowMap;
use super::record::InspectionRecord;
use super::time_points::{select_time_points, TimePointColumn};

/// Turns one inspection report grid into per-time-point records
///
/// Stateless apart from its immutable catalog: extracting the same grid twice
/// yields identical records, and one extractor can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct InspectionExtractor {
    catalog: Arc<MeasurementCatalog>,
}

impl InspectionExtractor {
    pub fn new(catalog: MeasurementCatalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
        }
    }

    pub fn catalog(&self) -> &MeasurementCatalog {
        &self.catalog
    }

    /// Load a report from raw bytes and extract its records
    pub fn extract_bytes(
        &self,
        filename: &str,
        bytes: &[u8],
    ) -> Result<Vec<InspectionRecord>, GridError> {
        let grid = Grid::from_bytes(filename, bytes)?;
        Ok(self.extract(&grid, filename))
    }

    /// Extract records from a loaded grid
    ///
    /// One record per labeled time-point column, in column order. Columns
    /// without a single measured value produce no record.
    #[instrument(skip(self, grid), fields(rows = grid.row_count()))]
    pub fn extract(&self, grid: &Grid, filename: &str) -> Vec<InspectionRecord> {
        let anchors = AnchorIndex::build(grid);
        let header = HeaderInfo::extract(grid, &anchors);
        let measurement_rows = MeasurementRowMap::resolve(&self.catalog, &anchors);
        let time_points = select_time_points(grid, &anchors);

        debug!(
            "Indexed {} anchor labels, resolved {}/{} measurement rows, found {} time points",
            anchors.len(),
            measurement_rows.resolved_count(),
            self.catalog.len(),
            time_points.len()
        );

        let records: Vec<InspectionRecord> = time_points
            .iter()
            .filter_map(|time_point| {
                assemble_record(grid, filename, &header, &measurement_rows, time_point)
            })
            .collect();

        debug!(
            "Kept {} of {} time points with measured data",
            records.len(),
            time_points.len()
        );

        records
    }
}

fn assemble_record(
    grid: &Grid,
    filename: &str,
    header: &HeaderInfo,
    measurement_rows: &MeasurementRowMap,
    time_point: &TimePointColumn,
) -> Option<InspectionRecord> {
    let mut record = InspectionRecord::new(filename, &time_point.label, header);

    for (field, row) in measurement_rows.resolved() {
        if let Some(value) = grid.value(row, time_point.column) {
            record.measurements.insert(field.to_string(), value.to_string());
        }
    }

    if record.has_measurements() {
        Some(record)
    } else {
        debug!("Dropping time point {:?}: no measured values", time_point.label);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_grid() -> Grid {
        Grid::from_str_rows([
            vec!["工令單號碼", "WO-123"],
            vec!["檢驗項目", "", "第一次", "時間標準"],
            vec!["鋼帶寬度", "", "10.2", ""],
        ])
    }

    #[test]
    fn test_single_time_point_record() {
        let records = InspectionExtractor::default().extract(&sample_grid(), "report.csv");

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.filename, "report.csv");
        assert_eq!(record.inspection_time_point, "第一次");
        assert_eq!(record.header.work_order_no.as_deref(), Some("WO-123"));
        assert_eq!(record.measurements.len(), 1);
        assert_eq!(record.value("StripWidth"), Some("10.2"));
    }

    #[test]
    fn test_column_without_measurements_is_dropped() {
        let grid = Grid::from_str_rows([
            vec!["檢驗項目", "", "08:00", "10:00", "12:00"],
            vec!["電流", "A", "300", "nan", ""],
            vec!["電壓", "V", "", "None", "  "],
        ]);
        let records = InspectionExtractor::default().extract(&grid, "r.csv");

        let labels: Vec<_> = records
            .iter()
            .map(|r| r.inspection_time_point.as_str())
            .collect();
        assert_eq!(labels, vec!["08:00"]);
        assert_eq!(records[0].value("Current"), Some("300"));
        assert_eq!(records[0].value("Voltage"), None);
    }

    #[test]
    fn test_values_are_trimmed() {
        let grid = Grid::from_str_rows([
            vec!["檢驗項目", "", "08:00"],
            vec!["長度", "", "  6000 \n"],
        ]);
        let records = InspectionExtractor::default().extract(&grid, "r.csv");
        assert_eq!(records[0].value("Length"), Some("6000"));
    }

    #[test]
    fn test_custom_catalog() {
        let catalog = MeasurementCatalog::from_json_str(
            r#"[{"field": "WallThickness", "keyword": "壁厚"}]"#,
        )
        .unwrap();
        let grid = Grid::from_str_rows([
            vec!["檢驗項目", "", "08:00"],
            vec!["壁厚", "", "3.2"],
            vec!["鋼帶寬度", "", "10.2"],
        ]);
        let records = InspectionExtractor::new(catalog).extract(&grid, "r.csv");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].value("WallThickness"), Some("3.2"));
        assert_eq!(records[0].value("StripWidth"), None);
    }

    #[test]
    fn test_extract_bytes_csv() {
        let csv = "工令單號碼,WO-7\n檢驗項目,,第一次\n電流,,280\n";
        let records = InspectionExtractor::default()
            .extract_bytes("r.csv", csv.as_bytes())
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].value("WorkOrderNo"), Some("WO-7"));
        assert_eq!(records[0].value("Current"), Some("280"));
    }

    #[test]
    fn test_deterministic() {
        let extractor = InspectionExtractor::default();
        let grid = sample_grid();
        assert_eq!(extractor.extract(&grid, "a"), extractor.extract(&grid, "a"));
    }
}
