use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::keyed::keyed_model;
use super::Audit;

/// Volunteer role advertised on the site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobOpportunity {
    #[serde(default)]
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub tag_line: String,
    #[serde(default)]
    pub full_description: String,
    #[serde(default = "crate::models::default_true")]
    pub is_active: bool,
    #[serde(flatten)]
    pub audit: Audit,
}

keyed_model!(
    JobOpportunity,
    name = "JobOpportunity",
    plural = "JobOpportunities",
    table = "job_opportunities"
);

/// A standing group of volunteers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    #[serde(default)]
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default = "crate::models::default_true")]
    pub is_active: bool,
    #[serde(flatten)]
    pub audit: Audit,
}

keyed_model!(Team, name = "Team", plural = "Teams", table = "teams");
