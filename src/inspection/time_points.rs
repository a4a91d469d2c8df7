use serde::Serialize;

use super::anchor_index::AnchorIndex;
use super::grid::Grid;
use super::label::normalize_label;

pub const INSPECTION_ITEM_KEYWORD: &str = "檢驗項目";
pub const TIME_STANDARD_KEYWORD: &str = "時間標準";

/// First column that can hold an inspection pass
pub const FIRST_TIME_POINT_COLUMN: usize = 2;

/// One labeled inspection pass column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimePointColumn {
    pub label: String,
    pub column: usize,
}

/// Find the labeled inspection pass columns on the "檢驗項目" row
///
/// Blank headers and the "時間標準" boilerplate column are skipped. Returns
/// an empty list when the report has no inspection item row.
pub fn select_time_points(grid: &Grid, anchors: &AnchorIndex) -> Vec<TimePointColumn> {
    let Some(row) = anchors.find(INSPECTION_ITEM_KEYWORD) else {
        return Vec::new();
    };

    let time_standard = normalize_label(Some(TIME_STANDARD_KEYWORD));

    grid.row(row)
        .iter()
        .enumerate()
        .skip(FIRST_TIME_POINT_COLUMN)
        .filter_map(|(column, cell)| {
            let raw = cell.as_deref()?;
            let label = normalize_label(Some(raw));
            if label.is_empty() || label == time_standard {
                None
            } else {
                Some(TimePointColumn { label, column })
            }
        })
        .collect()
}
