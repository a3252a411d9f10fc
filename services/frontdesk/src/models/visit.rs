//! Visitor and visit models

use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Visitor registration payload from the front desk
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterVisit {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub office: String,
    pub branch_id: Option<i64>,
    #[serde(default)]
    pub has_laptop: bool,
    pub laptop_brand: Option<String>,
    pub laptop_model: Option<String>,
    pub photo: Option<String>,
    pub id_photo_front: Option<String>,
    pub id_photo_back: Option<String>,
    pub sign_in_time: Option<DateTime<Utc>>,
    pub visitor_id: Option<i64>,
    #[serde(default = "default_new_visitor")]
    pub is_new_visitor: bool,
    pub digital_card_no: Option<String>,
    #[serde(default)]
    pub is_vendor: bool,
    pub company: Option<String>,
    pub person_in_charge: Option<String>,
}

fn default_new_visitor() -> bool {
    true
}

impl RegisterVisit {
    /// Name, phone number, reason and office must all be non-blank
    pub fn has_required_fields(&self) -> bool {
        [&self.name, &self.phone_number, &self.reason, &self.office]
            .iter()
            .all(|field| !field.trim().is_empty())
    }

    /// The manually entered card number, if any
    pub fn manual_card_number(&self) -> Option<&str> {
        self.digital_card_no
            .as_deref()
            .map(str::trim)
            .filter(|card| !card.is_empty())
    }
}

/// How the visit is attached to a visitor record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisitorChoice {
    /// Match by phone number, creating the visitor when unknown
    New { name: String, phone_number: String },
    /// An existing visitor picked from search results
    Returning { visitor_id: i64, phone_number: String },
}

/// Fully resolved visit ready to be written
#[derive(Debug, Clone)]
pub struct NewVisit {
    pub visitor: VisitorChoice,
    pub digital_card_no: String,
    pub reason: String,
    pub office: String,
    pub branch_id: i64,
    pub has_laptop: bool,
    pub laptop_brand: Option<String>,
    pub laptop_model: Option<String>,
    pub company: Option<String>,
    pub person_in_charge: Option<String>,
    pub photo: Option<Vec<u8>>,
    pub id_photo_front: Option<Vec<u8>>,
    pub id_photo_back: Option<Vec<u8>>,
    pub sign_in_time: DateTime<Utc>,
    pub registered_by: i64,
}

/// Identifiers produced by a registration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisteredVisit {
    pub visit_id: i64,
    pub visitor_id: i64,
}

/// Row of today's visit board
#[derive(Debug, Clone, Serialize)]
pub struct TodayVisit {
    pub id: i64,
    pub digital_card_no: String,
    pub name: String,
    pub reason: String,
    pub office: String,
    pub sign_in_time: DateTime<Utc>,
    pub sign_out_time: Option<DateTime<Utc>>,
    pub has_laptop: bool,
    pub laptop_brand: Option<String>,
    pub laptop_model: Option<String>,
    pub photo: Option<String>,
    pub branch_id: Option<i64>,
    pub branch_name: Option<String>,
    pub registered_by_name: Option<String>,
    pub total_visits: i32,
}

/// Status filter for today's visits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitStatusFilter {
    All,
    /// Still on the premises
    Active,
    /// Signed out
    Inactive,
}

impl VisitStatusFilter {
    pub fn from_query(status: Option<&str>) -> Self {
        match status {
            Some("active") => VisitStatusFilter::Active,
            Some("inactive") => VisitStatusFilter::Inactive,
            _ => VisitStatusFilter::All,
        }
    }
}

/// Result of a sign-out attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignOutOutcome {
    SignedOut,
    AlreadySignedOut,
    NotFound,
}

/// Which captured image of a visit to fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoKind {
    Photo,
    IdFront,
    IdBack,
}

impl PhotoKind {
    pub fn from_query(kind: Option<&str>) -> Self {
        match kind {
            Some("id_front") => PhotoKind::IdFront,
            Some("id_back") => PhotoKind::IdBack,
            _ => PhotoKind::Photo,
        }
    }

    /// Column holding the image bytes
    pub fn column(self) -> &'static str {
        match self {
            PhotoKind::Photo => "photo",
            PhotoKind::IdFront => "id_photo_front",
            PhotoKind::IdBack => "id_photo_back",
        }
    }
}

/// Visitor search hit
#[derive(Debug, Clone, Serialize)]
pub struct VisitorMatch {
    pub id: i64,
    pub name: String,
    pub phone_number: String,
    pub visits: i32,
    pub last_visit: Option<DateTime<Utc>>,
    pub last_visit_details: Option<LastVisitDetails>,
}

/// Details of a visitor's most recent visit, used to prefill the form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastVisitDetails {
    pub reason: String,
    pub office: String,
    pub has_laptop: bool,
    pub laptop_brand: Option<String>,
    pub laptop_model: Option<String>,
}

/// Decode an uploaded image sent as a data URL (or bare base64).
pub fn decode_data_url(value: &str) -> Result<Vec<u8>, String> {
    let encoded = match value.split_once(',') {
        Some((_, data)) => data,
        None => value,
    };
    STANDARD
        .decode(encoded.trim())
        .map_err(|e| format!("Invalid image data: {}", e))
}

/// Encode stored image bytes as a JPEG data URL
pub fn to_data_url(bytes: &[u8]) -> String {
    format!("data:image/jpeg;base64,{}", STANDARD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_data_url_strips_prefix() {
        let bytes = decode_data_url("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(bytes, b"hello");
        assert_eq!(decode_data_url("aGVsbG8=").unwrap(), b"hello");
        assert!(decode_data_url("data:image/png;base64,@@@").is_err());
    }

    #[test]
    fn test_to_data_url() {
        assert_eq!(to_data_url(b"hello"), "data:image/jpeg;base64,aGVsbG8=");
    }

    #[test]
    fn test_required_fields() {
        let mut visit = RegisterVisit {
            name: "Ada".into(),
            phone_number: "0700000000".into(),
            reason: "Meeting".into(),
            office: " ".into(),
            ..Default::default()
        };
        assert!(!visit.has_required_fields());
        visit.office = "Finance".into();
        assert!(visit.has_required_fields());
    }

    #[test]
    fn test_manual_card_number_ignores_blank() {
        let mut visit = RegisterVisit::default();
        assert_eq!(visit.manual_card_number(), None);
        visit.digital_card_no = Some("   ".into());
        assert_eq!(visit.manual_card_number(), None);
        visit.digital_card_no = Some(" VIS123456 ".into());
        assert_eq!(visit.manual_card_number(), Some("VIS123456"));
    }

    #[test]
    fn test_query_parsing_defaults() {
        assert_eq!(PhotoKind::from_query(None), PhotoKind::Photo);
        assert_eq!(PhotoKind::from_query(Some("id_back")).column(), "id_photo_back");
        assert_eq!(VisitStatusFilter::from_query(Some("active")), VisitStatusFilter::Active);
        assert_eq!(VisitStatusFilter::from_query(Some("bogus")), VisitStatusFilter::All);
    }
}
