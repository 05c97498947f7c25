use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A practitioner patients can be booked with. Read-only reference data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Practitioner {
    pub id: Uuid,
    pub full_name: String,
    pub specialty: Option<String>,
}

/// Projection of a visit row used by availability queries.
#[derive(Debug, Clone, Deserialize)]
pub struct BookedVisit {
    pub start_time: NaiveDateTime,
}
