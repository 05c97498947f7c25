use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;
use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::Patient;

/// Fixed identity-number format: three 3-digit groups joined by hyphens,
/// then a space and a 2-digit checksum group.
static IDENTITY_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{3}-\d{3}-\d{3} \d{2}$").unwrap());

pub fn is_valid_identity_number(value: &str) -> bool {
    IDENTITY_NUMBER_RE.is_match(value)
}

pub struct PatientService {
    supabase: SupabaseClient,
}

impl PatientService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Exact-match lookup by identity number. `Ok(None)` is a lookup miss,
    /// not an error; the booking flow re-prompts on it.
    pub async fn find_by_identity_number(&self, identity_number: &str) -> Result<Option<Patient>> {
        debug!("Looking up patient by identity number");

        let path = format!(
            "/rest/v1/patients?identity_number=eq.{}",
            urlencoding::encode(identity_number)
        );
        let result: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;

        match result.into_iter().next() {
            Some(row) => {
                let patient: Patient = serde_json::from_value(row)?;
                debug!("Patient found: {}", patient.id);
                Ok(Some(patient))
            }
            None => Ok(None),
        }
    }
}
