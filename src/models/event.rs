use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::keyed::keyed_model;
use super::lookup::event_status;
use super::Audit;

/// A scheduled cleanup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(default)]
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub event_date: DateTime<Utc>,
    #[serde(default)]
    pub duration_hours: i32,
    pub event_type_id: i32,
    #[serde(default = "default_status")]
    pub event_status_id: i32,
    #[serde(default)]
    pub street_address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub max_number_of_participants: i32,
    #[serde(default)]
    pub is_event_public: bool,
    #[serde(flatten)]
    pub audit: Audit,
}

fn default_status() -> i32 {
    event_status::ACTIVE
}

impl Event {
    /// Listed on the public events page.
    pub fn is_active(&self) -> bool {
        matches!(self.event_status_id, event_status::ACTIVE | event_status::FULL)
    }
}

keyed_model!(Event, name = "Event", plural = "Events", table = "events");
