use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use uuid::Uuid;

/// A visit that ended but has not been announced to its patient yet.
/// Projection of the visits table with the practitioner name embedded;
/// `end_time` is guaranteed non-null by the selection filter.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletedVisit {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub practitioner_id: Uuid,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub note: Option<String>,
    pub practitioner: PractitionerRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PractitionerRef {
    pub full_name: String,
}

// Clinical artifacts are read-only here: written by the practitioner's
// desktop software during the visit, only summarized by the bot.

#[derive(Debug, Clone, Deserialize)]
pub struct Diagnosis {
    pub name: String,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Referral {
    pub number: String,
    pub purpose: String,
    pub specialty: Option<String>,
    pub service_type: String,
    pub issued_on: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Prescription {
    pub medication: String,
    pub dosage: String,
    pub issued_on: NaiveDateTime,
    pub expires_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SickLeave {
    pub number: String,
    pub diagnosis: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: String,
    #[serde(rename = "type")]
    pub kind: String,
}
