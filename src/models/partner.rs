use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::keyed::keyed_model;
use super::{Audit, KeyedModel};

/// A government or business organisation that supports cleanups. Communities
/// are partners too; contacts and notes hang off the partner id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Partner {
    #[serde(default)]
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub primary_email: Option<String>,
    #[serde(default)]
    pub secondary_email: Option<String>,
    pub partner_type_id: i32,
    pub partner_status_id: i32,
    #[serde(default)]
    pub notes: String,
    #[serde(flatten)]
    pub audit: Audit,
}

impl KeyedModel for Partner {
    const NAME: &'static str = "Partner";
    const PLURAL: &'static str = "Partners";
    const TABLE: &'static str = "partners";

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }

    fn audit(&self) -> &Audit {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut Audit {
        &mut self.audit
    }

    fn partner_id(&self) -> Option<Uuid> {
        Some(self.id)
    }
}

/// A document (agreement, permit, ...) attached to a partner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerDocument {
    #[serde(default)]
    pub id: Uuid,
    pub partner_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(flatten)]
    pub audit: Audit,
}

keyed_model!(
    PartnerDocument,
    name = "PartnerDocument",
    plural = "PartnerDocuments",
    table = "partner_documents",
    parent = partner_id
);

/// A sponsor attached to a partner's adoption programme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sponsor {
    #[serde(default)]
    pub id: Uuid,
    pub partner_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default = "crate::models::default_true")]
    pub is_active: bool,
    #[serde(flatten)]
    pub audit: Audit,
}

keyed_model!(
    Sponsor,
    name = "Sponsor",
    plural = "Sponsors",
    table = "sponsors",
    parent = partner_id
);
