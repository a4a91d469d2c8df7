use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use super::header::HeaderInfo;

pub const FILENAME_FIELD: &str = "filename";
pub const TIME_POINT_FIELD: &str = "InspectionTimePoint";

/// One inspection pass of one report, flattened for storage
///
/// Measurements are sparse: only fields with a measured value at this pass
/// are present. Serializes to a flat JSON object keyed by column name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InspectionRecord {
    #[serde(rename = "filename")]
    pub filename: String,
    #[serde(rename = "InspectionTimePoint")]
    pub inspection_time_point: String,
    #[serde(flatten)]
    pub header: HeaderInfo,
    #[serde(flatten)]
    pub measurements: BTreeMap<String, String>,
}

impl InspectionRecord {
    pub fn new(filename: &str, inspection_time_point: &str, header: &HeaderInfo) -> Self {
        Self {
            filename: filename.to_string(),
            inspection_time_point: inspection_time_point.to_string(),
            header: header.clone(),
            measurements: BTreeMap::new(),
        }
    }

    pub fn has_measurements(&self) -> bool {
        !self.measurements.is_empty()
    }

    /// Value stored under a column name, if present on this record
    pub fn value(&self, column: &str) -> Option<&str> {
        match column {
            FILENAME_FIELD => Some(&self.filename),
            TIME_POINT_FIELD => Some(&self.inspection_time_point),
            _ => self
                .header
                .get(column)
                .or_else(|| self.measurements.get(column).map(String::as_str)),
        }
    }

    /// Column names present on this record
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        [FILENAME_FIELD, TIME_POINT_FIELD]
            .into_iter()
            .chain(self.header.present_fields().map(|(name, _)| name))
            .chain(self.measurements.keys().map(String::as_str))
    }
}

/// Sorted union of the column names used by a batch of records
pub fn column_union(records: &[InspectionRecord]) -> Vec<&str> {
    records
        .iter()
        .flat_map(InspectionRecord::columns)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(time_point: &str, measurements: &[(&str, &str)]) -> InspectionRecord {
        let header = HeaderInfo {
            work_order_no: Some("WO-1".to_string()),
            ..HeaderInfo::default()
        };
        let mut record = InspectionRecord::new("r.csv", time_point, &header);
        for (field, value) in measurements {
            record.measurements.insert(field.to_string(), value.to_string());
        }
        record
    }

    #[test]
    fn test_value_lookup() {
        let rec = record("08:00", &[("Length", "6000")]);
        assert_eq!(rec.value("filename"), Some("r.csv"));
        assert_eq!(rec.value("InspectionTimePoint"), Some("08:00"));
        assert_eq!(rec.value("WorkOrderNo"), Some("WO-1"));
        assert_eq!(rec.value("Customer"), None);
        assert_eq!(rec.value("Length"), Some("6000"));
        assert_eq!(rec.value("Voltage"), None);
    }

    #[test]
    fn test_column_union_is_sorted_and_deduplicated() {
        let records = vec![
            record("08:00", &[("Length", "6000")]),
            record("10:00", &[("Current", "300"), ("Length", "6001")]),
        ];
        assert_eq!(
            column_union(&records),
            vec!["Current", "InspectionTimePoint", "Length", "WorkOrderNo", "filename"]
        );
    }

    #[test]
    fn test_column_union_empty_batch() {
        assert!(column_union(&[]).is_empty());
    }

    #[test]
    fn test_serializes_flat() {
        let rec = record("08:00", &[("StripWidth", "10.2")]);
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "filename": "r.csv",
                "InspectionTimePoint": "08:00",
                "WorkOrderNo": "WO-1",
                "StripWidth": "10.2",
            })
        );
    }

    #[test]
    fn test_literal_none_text_is_a_value() {
        let mut rec = record("08:00", &[]);
        rec.measurements.insert("Appearance".to_string(), "none visible".to_string());
        assert_eq!(rec.value("Appearance"), Some("none visible"));
        assert!(rec.has_measurements());
    }
}
