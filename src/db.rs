pub mod error;
pub mod inspection_record_repository;

pub use error::DbError;
pub use inspection_record_repository::{InspectionRecordRepository, StoredInspectionRecord};
