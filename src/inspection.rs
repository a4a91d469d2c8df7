// Inspection report extraction
//
// This module turns a header-less inspection report (CSV or Excel) into flat
// per-time-point records. Rows are located by their label in column 0 or 1,
// inspection passes are the labeled columns from index 2 onward.

pub mod anchor_index;
pub mod catalog;
pub mod extractor;
pub mod grid;
pub mod header;
pub mod label;
pub mod measurement;
pub mod record;
pub mod time_points;

pub use anchor_index::AnchorIndex;
pub use catalog::{CatalogError, MeasurementCatalog, MeasurementSpec};
pub use extractor::InspectionExtractor;
pub use grid::{Grid, GridError, GridFormat};
pub use header::HeaderInfo;
pub use label::normalize_label;
pub use measurement::MeasurementRowMap;
pub use record::InspectionRecord;
pub use time_points::TimePointColumn;
