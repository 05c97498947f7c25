pub mod patient;

pub use patient::{PatientService, is_valid_identity_number};
