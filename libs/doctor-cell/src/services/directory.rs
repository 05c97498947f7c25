use anyhow::Result;
use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::Practitioner;

pub struct DirectoryService {
    supabase: SupabaseClient,
}

impl DirectoryService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Distinct non-null specialties, deduplicated client-side and sorted
    /// so the choice keyboard is stable between prompts.
    pub async fn list_specialties(&self) -> Result<Vec<String>> {
        debug!("Fetching distinct specialties");

        let path = "/rest/v1/practitioners?select=specialty&specialty=not.is.null";
        let result: Vec<Value> = self.supabase.request(Method::GET, path, None).await?;

        let mut specialties: Vec<String> = result
            .into_iter()
            .filter_map(|row| {
                row.get("specialty")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .collect();
        specialties.sort();
        specialties.dedup();

        Ok(specialties)
    }

    pub async fn list_by_specialty(&self, specialty: &str) -> Result<Vec<Practitioner>> {
        debug!("Fetching practitioners for specialty: {}", specialty);

        let path = format!(
            "/rest/v1/practitioners?specialty=eq.{}&order=full_name.asc",
            urlencoding::encode(specialty)
        );
        let result: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;

        let practitioners: Vec<Practitioner> = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(practitioners)
    }
}
