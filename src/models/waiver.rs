use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::keyed::keyed_model;
use super::Audit;

/// Liability waiver volunteers sign before attending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Waiver {
    #[serde(default)]
    pub id: Uuid,
    pub name: String,
    pub effective_date: DateTime<Utc>,
    #[serde(default)]
    pub expiry_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_waiver_enabled: bool,
    #[serde(default)]
    pub waiver_text: String,
    #[serde(flatten)]
    pub audit: Audit,
}

keyed_model!(Waiver, name = "Waiver", plural = "Waivers", table = "waivers");
