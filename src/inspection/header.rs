use serde::{Deserialize, Serialize};

use super::anchor_index::AnchorIndex;
use super::grid::Grid;

pub const WORK_ORDER_KEYWORD: &str = "工令單號碼";
pub const CUSTOMER_KEYWORD: &str = "客戶";
pub const SPECIFICATION_KEYWORD: &str = "鋼管規格";
pub const MATERIAL_KEYWORD: &str = "材質";
pub const PERSONNEL_KEYWORD: &str = "品保課長";
pub const JUDGEMENT_KEYWORD: &str = "判定";

/// Document-level fields shared by every record extracted from one report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderInfo {
    #[serde(rename = "WorkOrderNo", skip_serializing_if = "Option::is_none")]
    pub work_order_no: Option<String>,
    #[serde(rename = "Customer", skip_serializing_if = "Option::is_none")]
    pub customer: Option<String>,
    #[serde(rename = "Specification", skip_serializing_if = "Option::is_none")]
    pub specification: Option<String>,
    #[serde(rename = "Material", skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    #[serde(rename = "QA_Manager", skip_serializing_if = "Option::is_none")]
    pub qa_manager: Option<String>,
    #[serde(rename = "Production_Manager", skip_serializing_if = "Option::is_none")]
    pub production_manager: Option<String>,
    #[serde(rename = "Inspector", skip_serializing_if = "Option::is_none")]
    pub inspector: Option<String>,
    #[serde(rename = "Judgement", skip_serializing_if = "Option::is_none")]
    pub judgement: Option<String>,
}

impl HeaderInfo {
    /// Column names of all header fields, in storage order
    pub const FIELD_NAMES: [&'static str; 8] = [
        "WorkOrderNo",
        "Customer",
        "Specification",
        "Material",
        "QA_Manager",
        "Production_Manager",
        "Inspector",
        "Judgement",
    ];

    /// Pull header fields out of the grid. Every group is independent; a
    /// missing anchor leaves that group's fields unset.
    pub fn extract(grid: &Grid, anchors: &AnchorIndex) -> Self {
        let mut header = HeaderInfo::default();

        if let Some(row) = anchors.find(WORK_ORDER_KEYWORD) {
            header.work_order_no = owned(grid.value(row, 1));
            header.customer = value_after_marker(grid, row, CUSTOMER_KEYWORD);
        }

        if let Some(row) = anchors.find(SPECIFICATION_KEYWORD) {
            header.specification = owned(grid.value(row, 1));
            header.material = value_after_marker(grid, row, MATERIAL_KEYWORD);
        }

        // Personnel names sit at fixed offsets on the signature row
        if let Some(row) = anchors.find(PERSONNEL_KEYWORD) {
            header.qa_manager = owned(grid.value(row, 1));
            header.production_manager = owned(grid.value(row, 3));
            header.inspector = owned(grid.value(row, 5));
        }

        if let Some(row) = anchors.find(JUDGEMENT_KEYWORD) {
            header.judgement = owned(grid.value(row, 2));
        }

        header
    }

    /// Look up a header field by its column name
    pub fn get(&self, field: &str) -> Option<&str> {
        let value = match field {
            "WorkOrderNo" => &self.work_order_no,
            "Customer" => &self.customer,
            "Specification" => &self.specification,
            "Material" => &self.material,
            "QA_Manager" => &self.qa_manager,
            "Production_Manager" => &self.production_manager,
            "Inspector" => &self.inspector,
            "Judgement" => &self.judgement,
            _ => return None,
        };
        value.as_deref()
    }

    /// Header fields that carry a value, as (column name, value)
    pub fn present_fields(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        Self::FIELD_NAMES
            .into_iter()
            .filter_map(move |name| self.get(name).map(|value| (name, value)))
    }
}

/// Value in the cell right after the first cell of `row` containing `marker`
fn value_after_marker(grid: &Grid, row: usize, marker: &str) -> Option<String> {
    grid.row(row)
        .iter()
        .position(|cell| cell.as_deref().is_some_and(|text| text.contains(marker)))
        .and_then(|col| owned(grid.value(row, col + 1)))
}

fn owned(value: Option<&str>) -> Option<String> {
    value.map(str::to_string)
}
