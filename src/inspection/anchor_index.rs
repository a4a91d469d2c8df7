use std::collections::HashMap;

use super::grid::Grid;
use super::label::normalize_label;

/// Normalized label → row position for the first two columns of a grid
///
/// The first occurrence of a label wins, so a stray duplicate further down
/// the report never shadows the real anchor row.
#[derive(Debug, Clone, Default)]
pub struct AnchorIndex {
    rows: HashMap<String, usize>,
}

impl AnchorIndex {
    pub fn build(grid: &Grid) -> Self {
        let mut rows = HashMap::new();

        for (row_idx, row) in grid.rows().enumerate() {
            for cell in row.iter().take(2) {
                let key = normalize_label(cell.as_deref());
                if !key.is_empty() {
                    rows.entry(key).or_insert(row_idx);
                }
            }
        }

        Self { rows }
    }

    /// Row holding `keyword` (compared after normalization), if any
    pub fn find(&self, keyword: &str) -> Option<usize> {
        let key = normalize_label(Some(keyword));
        if key.is_empty() {
            return None;
        }
        self.rows.get(&key).copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
