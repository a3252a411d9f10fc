//! Branch model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Branch with its office and visit-reason lists
#[derive(Debug, Clone, Serialize)]
pub struct Branch {
    pub id: i64,
    pub name: String,
    pub location: String,
    pub offices: Vec<String>,
    pub reasons: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Branch create/update payload as submitted by the client
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BranchPayload {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub offices: Vec<String>,
    #[serde(default)]
    pub reasons: Vec<String>,
}

/// Normalized branch data ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchInput {
    pub name: String,
    pub location: String,
    pub offices: Vec<String>,
    pub reasons: Vec<String>,
}

impl BranchPayload {
    /// Trim every field and drop blank offices and reasons.
    ///
    /// Fails when the name or location is blank.
    pub fn normalize(self) -> Result<BranchInput, String> {
        let name = self.name.trim().to_string();
        let location = self.location.trim().to_string();
        if name.is_empty() || location.is_empty() {
            return Err("Name and location are required".to_string());
        }

        Ok(BranchInput {
            name,
            location,
            offices: clean_labels(self.offices),
            reasons: clean_labels(self.reasons),
        })
    }
}

fn clean_labels(labels: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = labels
        .into_iter()
        .map(|label| label.trim().to_string())
        .filter(|label| !label.is_empty())
        .collect();
    cleaned.sort();
    cleaned.dedup();
    cleaned
}
