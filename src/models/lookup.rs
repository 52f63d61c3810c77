use serde::Serialize;

/// Read-only reference data (statuses, types, categories).
pub trait LookupModel: Serialize + Clone + Send + Sync + Unpin + 'static {
    /// Plural display name used in telemetry events ("GetEventTypes").
    const PLURAL: &'static str;
    /// Backing table for the PostgreSQL store.
    const TABLE: &'static str;

    fn id(&self) -> i32;
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn display_order(&self) -> i32;
    fn is_active(&self) -> bool;

    /// Rows seeded into a fresh store.
    fn defaults() -> Vec<Self>;
}

macro_rules! lookup_model {
    ($(#[$meta:meta])* $ty:ident, plural = $plural:literal, table = $table:literal, [$($name:literal),+ $(,)?]) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, ::serde::Serialize, ::serde::Deserialize, ::sqlx::FromRow)]
        #[serde(rename_all = "camelCase")]
        pub struct $ty {
            pub id: i32,
            pub name: String,
            pub description: String,
            pub display_order: i32,
            pub is_active: bool,
        }

        impl LookupModel for $ty {
            const PLURAL: &'static str = $plural;
            const TABLE: &'static str = $table;

            fn id(&self) -> i32 {
                self.id
            }

            fn name(&self) -> &str {
                &self.name
            }

            fn description(&self) -> &str {
                &self.description
            }

            fn display_order(&self) -> i32 {
                self.display_order
            }

            fn is_active(&self) -> bool {
                self.is_active
            }

            fn defaults() -> Vec<Self> {
                [$($name),+]
                    .iter()
                    .zip(1..)
                    .map(|(name, id)| $ty {
                        id,
                        name: name.to_string(),
                        description: name.to_string(),
                        display_order: id,
                        is_active: true,
                    })
                    .collect()
            }
        }
    };
}

lookup_model!(
    /// Kind of cleanup (park, beach, highway, ...).
    EventType,
    plural = "EventTypes",
    table = "event_types",
    [
        "Park Cleanup",
        "School Cleanup",
        "Neighborhood Cleanup",
        "Beach Cleanup",
        "Highway Cleanup",
        "Natural Disaster Cleanup",
        "Trail Cleanup",
        "Reef Cleanup",
        "Private Land Cleanup",
        "Dog Park Cleanup",
        "Waterway Cleanup",
        "Vandalism Cleanup",
        "Social Event",
        "Other",
    ]
);

lookup_model!(
    EventStatus,
    plural = "EventStatuses",
    table = "event_statuses",
    ["Active", "Full", "Canceled", "Complete"]
);

lookup_model!(
    PartnerType,
    plural = "PartnerTypes",
    table = "partner_types",
    ["Government", "Business"]
);

lookup_model!(
    PartnerStatus,
    plural = "PartnerStatuses",
    table = "partner_statuses",
    ["Active", "Inactive"]
);

lookup_model!(
    /// Services a partner location can offer to an event.
    ServiceType,
    plural = "ServiceTypes",
    table = "service_types",
    ["Hauling", "Disposal Location", "Startup Kits", "Supplies"]
);

lookup_model!(
    InvitationStatus,
    plural = "InvitationStatuses",
    table = "invitation_statuses",
    ["New", "Sent", "Accepted", "Canceled", "Declined"]
);

/// `EventStatus` ids the rest of the code branches on.
pub mod event_status {
    pub const ACTIVE: i32 = 1;
    pub const FULL: i32 = 2;
    pub const CANCELED: i32 = 3;
    pub const COMPLETE: i32 = 4;
}
