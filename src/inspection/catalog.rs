//! Measurement catalog: canonical record field → row label keyword
//!
//! The catalog is configuration, not code: the default table covers the
//! pipe mill inspection report, and a JSON file can replace it for other
//! report layouts. Field names end up as storage column names, so they are
//! restricted to plain SQL identifiers.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;

use super::label::normalize_label;

static FIELD_NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static pattern is valid"));

const DEFAULT_MEASUREMENTS: [(&str, &str); 21] = [
    ("StripWidth", "鋼帶寬度"),
    ("StripThickness", "鋼帶厚度"),
    ("Current", "電流"),
    ("Voltage", "電壓"),
    ("WeldingSpeed", "熔接速度"),
    ("AnnealingTemp", "焊縫退火溫度"),
    ("WeldSeam", "内外焊道刮除"),
    ("WeldSeamAppearance", "外焊道需平順"),
    ("Sizing_Da", "定徑前(Da)"),
    ("Sizing_Db", "定徑後(Db)"),
    ("SizingRate", "定徑率"),
    ("OD_Upper", "外徑"),
    ("OD_Lower", "下限"),
    ("Roundness", "真圓度"),
    ("Appearance", "外觀"),
    ("Length", "長度"),
    ("Straightness", "直度"),
    ("PortVerticality", "端口垂直度"),
    ("BevelAngle", "修端斜角"),
    ("RootFace", "根面"),
    ("BendFlattening", "導彎、壓扁"),
];

/// Names reserved for header and bookkeeping columns
const RESERVED_FIELDS: [&str; 12] = [
    "filename",
    "InspectionTimePoint",
    "WorkOrderNo",
    "Customer",
    "Specification",
    "Material",
    "QA_Manager",
    "Production_Manager",
    "Inspector",
    "Judgement",
    "id",
    "created_at",
];

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid catalog JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Catalog is empty")]
    Empty,

    #[error("Invalid field name: {0:?}")]
    InvalidFieldName(String),

    #[error("Field name is reserved: {0}")]
    ReservedFieldName(String),

    #[error("Duplicate field name: {0}")]
    DuplicateFieldName(String),

    #[error("Keyword for field {0} is blank after normalization")]
    BlankKeyword(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurementSpec {
    pub field: String,
    pub keyword: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasurementCatalog {
    specs: Vec<MeasurementSpec>,
}

impl MeasurementCatalog {
    pub fn new(specs: Vec<MeasurementSpec>) -> Result<Self, CatalogError> {
        if specs.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::new();
        for spec in &specs {
            if !FIELD_NAME_PATTERN.is_match(&spec.field) {
                return Err(CatalogError::InvalidFieldName(spec.field.clone()));
            }
            if RESERVED_FIELDS.contains(&spec.field.as_str()) {
                return Err(CatalogError::ReservedFieldName(spec.field.clone()));
            }
            if !seen.insert(spec.field.as_str()) {
                return Err(CatalogError::DuplicateFieldName(spec.field.clone()));
            }
            if normalize_label(Some(&spec.keyword)).is_empty() {
                return Err(CatalogError::BlankKeyword(spec.field.clone()));
            }
        }

        Ok(Self { specs })
    }

    /// Load a catalog from a JSON array of `{"field": ..., "keyword": ...}`
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let specs: Vec<MeasurementSpec> = serde_json::from_str(json)?;
        Self::new(specs)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Catalog from an optional file, falling back to the default table
    pub fn load(path: Option<&Path>) -> Result<Self, CatalogError> {
        match path {
            Some(path) => Self::from_json_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn specs(&self) -> &[MeasurementSpec] {
        &self.specs
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl Default for MeasurementCatalog {
    fn default() -> Self {
        let specs = DEFAULT_MEASUREMENTS
            .iter()
            .map(|(field, keyword)| MeasurementSpec {
                field: field.to_string(),
                keyword: keyword.to_string(),
            })
            .collect();
        Self { specs }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(field: &str, keyword: &str) -> MeasurementSpec {
        MeasurementSpec {
            field: field.to_string(),
            keyword: keyword.to_string(),
        }
    }

    #[test]
    fn test_default_catalog_passes_validation() {
        let default = MeasurementCatalog::default();
        assert_eq!(default.len(), 21);
        let validated = MeasurementCatalog::new(default.specs().to_vec()).unwrap();
        assert_eq!(validated, default);
    }

    #[test]
    fn test_from_json() {
        let catalog = MeasurementCatalog::from_json_str(
            r#"[{"field": "WallThickness", "keyword": "壁厚"}]"#,
        )
        .unwrap();
        assert_eq!(catalog.specs(), &[spec("WallThickness", "壁厚")]);
    }

    #[test]
    fn test_rejects_unsafe_field_name() {
        let result = MeasurementCatalog::new(vec![spec("x\"; DROP TABLE t; --", "長度")]);
        assert!(matches!(result, Err(CatalogError::InvalidFieldName(_))));
    }

    #[test]
    fn test_rejects_reserved_field_name() {
        let result = MeasurementCatalog::new(vec![spec("filename", "長度")]);
        assert!(matches!(result, Err(CatalogError::ReservedFieldName(_))));
    }

    #[test]
    fn test_rejects_duplicates() {
        let result = MeasurementCatalog::new(vec![spec("Length", "長度"), spec("Length", "直度")]);
        assert!(matches!(result, Err(CatalogError::DuplicateFieldName(_))));
    }

    #[test]
    fn test_rejects_blank_keyword() {
        let result = MeasurementCatalog::new(vec![spec("Length", " ( ) ")]);
        assert!(matches!(result, Err(CatalogError::BlankKeyword(_))));
    }

    #[test]
    fn test_rejects_empty() {
        assert!(matches!(
            MeasurementCatalog::from_json_str("[]"),
            Err(CatalogError::Empty)
        ));
    }

    #[test]
    fn test_load_without_path_is_default() {
        assert_eq!(MeasurementCatalog::load(None).unwrap(), MeasurementCatalog::default());
    }
}
