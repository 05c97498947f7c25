use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered patient. Looked up by identity number, never written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub identity_number: String,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub phone_number: Option<String>,
}

impl Patient {
    pub fn full_name(&self) -> String {
        match &self.middle_name {
            Some(middle) => format!("{} {} {}", self.last_name, self.first_name, middle),
            None => format!("{} {}", self.last_name, self.first_name),
        }
    }
}
