use anyhow::Result;
use chrono::NaiveDateTime;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, info};
use uuid::Uuid;

use booking_cell::services::PatientChatIndex;
use shared_chat::ChatTransport;
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{CompletedVisit, Diagnosis, Prescription, Referral, SickLeave};
use crate::services::summary;

/// Sick-leave rows are selected on their issue date, mirroring the
/// prescription filter, even though the displayed period uses the
/// certificate's start/end dates. Kept explicit so the choice is visible
/// and changeable in one place.
pub const SICK_LEAVE_FILTER_COLUMN: &str = "issue_date";

/// Recurring scan that announces completed visits exactly once per
/// successful run. Marks a visit notified only after every message for it
/// was sent, so a mid-run failure re-delivers on the next tick rather
/// than silently dropping the notification.
pub struct NotificationService {
    supabase: SupabaseClient,
}

impl NotificationService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// One reconciliation pass. The first error aborts the whole run;
    /// visits not yet marked stay eligible for the next pass.
    pub async fn run_once(
        &self,
        index: &PatientChatIndex,
        transport: &dyn ChatTransport,
    ) -> Result<()> {
        let visits = self.fetch_unnotified().await?;
        debug!("{} completed visits awaiting notification", visits.len());

        for visit in visits {
            let Some(chat) = index.chat_for_patient(visit.patient_id) else {
                // No chat ever resolved this patient; the visit stays
                // eligible and is retried on later runs.
                debug!(
                    "No chat mapping for patient {}, skipping visit {}",
                    visit.patient_id, visit.id
                );
                continue;
            };

            transport
                .send_text(chat, &summary::visit_summary(&visit))
                .await?;

            let mut any_records = false;

            let diagnoses = self
                .records_in_window::<Diagnosis>(
                    "diagnoses",
                    "created_at",
                    &visit,
                )
                .await?;
            if !diagnoses.is_empty() {
                any_records = true;
                transport
                    .send_text(chat, &summary::diagnosis_listing(&diagnoses))
                    .await?;
            }

            let referrals = self
                .records_in_window::<Referral>("referrals", "issued_on", &visit)
                .await?;
            if !referrals.is_empty() {
                any_records = true;
                transport
                    .send_text(chat, &summary::referral_listing(&referrals))
                    .await?;
            }

            let prescriptions = self
                .records_in_window::<Prescription>("prescriptions", "issued_on", &visit)
                .await?;
            if !prescriptions.is_empty() {
                any_records = true;
                transport
                    .send_text(chat, &summary::prescription_listing(&prescriptions))
                    .await?;
            }

            let sick_leaves = self
                .records_in_window::<SickLeave>("sick_leaves", SICK_LEAVE_FILTER_COLUMN, &visit)
                .await?;
            if !sick_leaves.is_empty() {
                any_records = true;
                transport
                    .send_text(chat, &summary::sick_leave_listing(&sick_leaves))
                    .await?;
            }

            if !any_records {
                transport.send_text(chat, summary::NO_RECORDS_MESSAGE).await?;
            }

            self.mark_notified(visit.id).await?;
            info!("Visit {} notification delivered to chat {}", visit.id, chat);
        }

        Ok(())
    }

    /// Visits eligible for notification: end time set, notified flag clear.
    async fn fetch_unnotified(&self) -> Result<Vec<CompletedVisit>> {
        let path = "/rest/v1/visits?end_time=not.is.null&notified=eq.false\
                    &select=id,patient_id,practitioner_id,start_time,end_time,note,practitioner:practitioners(full_name)";
        let result: Vec<Value> = self.supabase.request(Method::GET, path, None).await?;

        let visits: Vec<CompletedVisit> = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(visits)
    }

    /// Clinical records for the visit's patient+practitioner pair whose
    /// `filter_column` timestamp lies in the closed [start, end] window.
    async fn records_in_window<T>(
        &self,
        table: &str,
        filter_column: &str,
        visit: &CompletedVisit,
    ) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let path = format!(
            "/rest/v1/{}?patient_id=eq.{}&practitioner_id=eq.{}&{}=gte.{}&{}=lte.{}",
            table,
            visit.patient_id,
            visit.practitioner_id,
            filter_column,
            pg_timestamp(visit.start_time),
            filter_column,
            pg_timestamp(visit.end_time),
        );
        let result: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;

        let records: Vec<T> = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    async fn mark_notified(&self, visit_id: Uuid) -> Result<()> {
        let path = format!("/rest/v1/visits?id=eq.{}", visit_id);
        self.supabase
            .execute(Method::PATCH, &path, Some(json!({ "notified": true })))
            .await
    }
}

fn pg_timestamp(value: NaiveDateTime) -> String {
    value.format("%Y-%m-%dT%H:%M:%S").to_string()
}
