pub mod inspection_import_service;

pub use inspection_import_service::{ImportOutcome, InspectionImportError, InspectionImportService};
