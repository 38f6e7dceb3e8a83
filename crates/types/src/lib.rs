//! Core data types for the CHD risk inference service.
//!
//! Modules:
//! - `record`: PatientRecord, ModelInputRow, RiskLabel, BMI derivation
//! - `schema`: explicit validation of untyped JSON payloads
//! - `errors`: validation and domain error taxonomy

pub mod errors;
pub mod record;
pub mod schema;

pub use errors::{DomainError, ValidationError};
pub use record::{ModelInputRow, PatientRecord, RiskLabel, FEATURE_COLUMNS};
pub use schema::parse_patient_record;
