use super::anchor_index::AnchorIndex;
use super::catalog::MeasurementCatalog;

/// Row position of every catalog measurement in one report
///
/// Entries keep catalog order. A measurement whose label is not in the
/// report stays unresolved; there is no positional fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasurementRowMap {
    rows: Vec<(String, Option<usize>)>,
}

impl MeasurementRowMap {
    pub fn resolve(catalog: &MeasurementCatalog, anchors: &AnchorIndex) -> Self {
        let rows = catalog
            .specs()
            .iter()
            .map(|spec| (spec.field.clone(), anchors.find(&spec.keyword)))
            .collect();
        Self { rows }
    }

    pub fn row_of(&self, field: &str) -> Option<usize> {
        self.rows
            .iter()
            .find(|(name, _)| name == field)
            .and_then(|(_, row)| *row)
    }

    /// Measurements that were found, as (field, row)
    pub fn resolved(&self) -> impl Iterator<Item = (&str, usize)> {
        self.rows
            .iter()
            .filter_map(|(field, row)| row.map(|row| (field.as_str(), row)))
    }

    pub fn resolved_count(&self) -> usize {
        self.resolved().count()
    }
}
