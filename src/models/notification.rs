use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::keyed::keyed_model;
use super::Audit;

/// Whether a user has opted out of one kind of notification email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserNotificationPreference {
    #[serde(default)]
    pub id: Uuid,
    #[serde(default)]
    pub user_id: Uuid,
    pub user_notification_type_id: i32,
    #[serde(default)]
    pub is_opted_out: bool,
    #[serde(flatten)]
    pub audit: Audit,
}

keyed_model!(
    UserNotificationPreference,
    name = "UserNotificationPreference",
    plural = "UserNotificationPreferences",
    table = "user_notification_preferences",
    parent = user_id
);
