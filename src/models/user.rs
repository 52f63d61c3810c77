use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Internal user record. `name_identifier` is the external identity claim
/// (the bearer token subject) the record is resolved by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name_identifier: String,
    pub user_name: String,
    pub email: String,
    pub is_site_admin: bool,
    pub created_date: DateTime<Utc>,
}

impl User {
    pub fn new(name_identifier: impl Into<String>, user_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name_identifier: name_identifier.into(),
            user_name: user_name.into(),
            email: email.into(),
            is_site_admin: false,
            created_date: super::now(),
        }
    }

    pub fn site_admin(mut self) -> Self {
        self.is_site_admin = true;
        self
    }
}
