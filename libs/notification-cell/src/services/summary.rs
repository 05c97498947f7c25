//! Message rendering for completed-visit notifications.

use crate::models::{CompletedVisit, Diagnosis, Prescription, Referral, SickLeave};

const DATE_FORMAT: &str = "%d.%m.%Y";
const TIME_FORMAT: &str = "%H:%M";
const NOT_SPECIFIED: &str = "not specified";

pub const NO_RECORDS_MESSAGE: &str =
    "No diagnoses, referrals or prescriptions were added after your visit.";

pub fn visit_summary(visit: &CompletedVisit) -> String {
    format!(
        "Your visit with {} is complete.\nDate: {}\nTime: {}-{}\nNote: {}",
        visit.practitioner.full_name,
        visit.start_time.format(DATE_FORMAT),
        visit.start_time.format(TIME_FORMAT),
        visit.end_time.format(TIME_FORMAT),
        visit.note.as_deref().unwrap_or(NOT_SPECIFIED),
    )
}

pub fn diagnosis_listing(diagnoses: &[Diagnosis]) -> String {
    let entries: Vec<String> = diagnoses
        .iter()
        .map(|d| {
            format!(
                "\u{2022} {}\nDescription: {}\nDate: {}",
                d.name,
                d.description.as_deref().unwrap_or("no description"),
                d.created_at.format(DATE_FORMAT),
            )
        })
        .collect();
    format!("Diagnoses recorded:\n{}", entries.join("\n\n"))
}

pub fn referral_listing(referrals: &[Referral]) -> String {
    let entries: Vec<String> = referrals
        .iter()
        .map(|r| {
            format!(
                "\u{2022} Number: {}\nPurpose: {}\nSpecialty: {}\nService type: {}\nDate: {}",
                r.number,
                r.purpose,
                r.specialty.as_deref().unwrap_or(NOT_SPECIFIED),
                r.service_type,
                r.issued_on.format(DATE_FORMAT),
            )
        })
        .collect();
    format!("Referrals issued:\n{}", entries.join("\n\n"))
}

pub fn prescription_listing(prescriptions: &[Prescription]) -> String {
    let entries: Vec<String> = prescriptions
        .iter()
        .map(|p| {
            format!(
                "\u{2022} Medication: {}\nDosage: {}\nIssued: {}\nValid until: {}",
                p.medication,
                p.dosage,
                p.issued_on.format(DATE_FORMAT),
                p.expires_on
                    .map(|d| d.format(DATE_FORMAT).to_string())
                    .unwrap_or_else(|| NOT_SPECIFIED.to_string()),
            )
        })
        .collect();
    format!("Prescriptions issued:\n{}", entries.join("\n\n"))
}

pub fn sick_leave_listing(sick_leaves: &[SickLeave]) -> String {
    let entries: Vec<String> = sick_leaves
        .iter()
        .map(|s| {
            format!(
                "\u{2022} Number: {}\nDiagnosis: {}\nPeriod: {} - {}\nStatus: {}\nType: {}",
                s.number,
                s.diagnosis,
                s.start_date.format(DATE_FORMAT),
                s.end_date.format(DATE_FORMAT),
                s.status,
                s.kind,
            )
        })
        .collect();
    format!("Sick-leave certificates issued:\n{}", entries.join("\n\n"))
}
