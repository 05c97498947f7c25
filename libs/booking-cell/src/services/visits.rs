use anyhow::{Result, anyhow};
use chrono::NaiveDateTime;
use reqwest::Method;
use serde_json::{Value, json};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::Visit;

pub struct VisitService {
    supabase: SupabaseClient,
}

impl VisitService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Inserts a freshly booked visit. End time stays null until the visit
    /// is closed elsewhere; the notified flag starts false.
    pub async fn create_visit(
        &self,
        patient_id: Uuid,
        practitioner_id: Uuid,
        start_time: NaiveDateTime,
        note: Option<&str>,
    ) -> Result<Visit> {
        debug!(
            "Creating visit for patient {} with practitioner {} at {}",
            patient_id, practitioner_id, start_time
        );

        let visit_data = json!({
            "patient_id": patient_id,
            "practitioner_id": practitioner_id,
            "start_time": start_time.format("%Y-%m-%dT%H:%M:%S").to_string(),
            "note": note,
            "notified": false
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(Method::POST, "/rest/v1/visits", Some(visit_data), Some(headers))
            .await?;

        let row = result
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Failed to create visit"))?;
        let visit: Visit = serde_json::from_value(row)?;
        debug!("Visit created with ID: {}", visit.id);

        Ok(visit)
    }
}
