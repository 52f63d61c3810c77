use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::keyed::keyed_model;
use super::Audit;

/// Person a community (partner) can be reached through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityContact {
    #[serde(default)]
    pub id: Uuid,
    pub community_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default = "crate::models::default_true")]
    pub is_active: bool,
    #[serde(flatten)]
    pub audit: Audit,
}

keyed_model!(
    CommunityContact,
    name = "CommunityContact",
    plural = "CommunityContacts",
    table = "community_contacts",
    parent = community_id
);

/// Free-form note left against a community.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityNote {
    #[serde(default)]
    pub id: Uuid,
    pub community_id: Uuid,
    #[serde(default)]
    pub contact_id: Option<Uuid>,
    pub body: String,
    #[serde(flatten)]
    pub audit: Audit,
}

keyed_model!(
    CommunityNote,
    name = "CommunityNote",
    plural = "CommunityNotes",
    table = "community_notes",
    parent = community_id
);
