use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;

use crate::auth::JwtKeys;
use crate::authorization::PolicyAuthorizer;
use crate::database::{
    DatabaseManager, InMemoryKeyedStore, InMemoryLookupStore, InMemoryPartnerAdmins, InMemoryUsers, PgKeyedStore,
    PgLookupStore, PgPartnerAdminRepository, PgUserRepository,
};
use crate::dispatch::Services;
use crate::managers::{KeyedManager, LookupManager, PartnerAdminRepository, UserRepository};
use crate::models::{
    CommunityContact, CommunityNote, Event, EventStatus, EventType, InvitationStatus, JobOpportunity, Partner,
    PartnerDocument, PartnerStatus, PartnerType, ServiceType, Sponsor, Team, UserNotificationPreference, Waiver,
};
use crate::telemetry::Telemetry;

/// Every collaborator the controllers are built from.
#[derive(Clone)]
pub struct Stores {
    pub events: Arc<dyn KeyedManager<Event>>,
    pub partners: Arc<dyn KeyedManager<Partner>>,
    pub partner_documents: Arc<dyn KeyedManager<PartnerDocument>>,
    pub sponsors: Arc<dyn KeyedManager<Sponsor>>,
    pub waivers: Arc<dyn KeyedManager<Waiver>>,
    pub job_opportunities: Arc<dyn KeyedManager<JobOpportunity>>,
    pub teams: Arc<dyn KeyedManager<Team>>,
    pub community_contacts: Arc<dyn KeyedManager<CommunityContact>>,
    pub community_notes: Arc<dyn KeyedManager<CommunityNote>>,
    pub notification_preferences: Arc<dyn KeyedManager<UserNotificationPreference>>,

    pub event_types: Arc<dyn LookupManager<EventType>>,
    pub event_statuses: Arc<dyn LookupManager<EventStatus>>,
    pub partner_types: Arc<dyn LookupManager<PartnerType>>,
    pub partner_statuses: Arc<dyn LookupManager<PartnerStatus>>,
    pub service_types: Arc<dyn LookupManager<ServiceType>>,
    pub invitation_statuses: Arc<dyn LookupManager<InvitationStatus>>,

    pub users: Arc<dyn UserRepository>,
    pub partner_admins: Arc<dyn PartnerAdminRepository>,
}

impl Stores {
    /// Process-local stores with seeded lookup tables and no users.
    pub fn in_memory() -> Self {
        Self {
            events: Arc::new(InMemoryKeyedStore::<Event>::default()),
            partners: Arc::new(InMemoryKeyedStore::<Partner>::default()),
            partner_documents: Arc::new(InMemoryKeyedStore::<PartnerDocument>::default()),
            sponsors: Arc::new(InMemoryKeyedStore::<Sponsor>::default()),
            waivers: Arc::new(InMemoryKeyedStore::<Waiver>::default()),
            job_opportunities: Arc::new(InMemoryKeyedStore::<JobOpportunity>::default()),
            teams: Arc::new(InMemoryKeyedStore::<Team>::default()),
            community_contacts: Arc::new(InMemoryKeyedStore::<CommunityContact>::default()),
            community_notes: Arc::new(InMemoryKeyedStore::<CommunityNote>::default()),
            notification_preferences: Arc::new(InMemoryKeyedStore::<UserNotificationPreference>::default()),

            event_types: Arc::new(InMemoryLookupStore::<EventType>::seeded()),
            event_statuses: Arc::new(InMemoryLookupStore::<EventStatus>::seeded()),
            partner_types: Arc::new(InMemoryLookupStore::<PartnerType>::seeded()),
            partner_statuses: Arc::new(InMemoryLookupStore::<PartnerStatus>::seeded()),
            service_types: Arc::new(InMemoryLookupStore::<ServiceType>::seeded()),
            invitation_statuses: Arc::new(InMemoryLookupStore::<InvitationStatus>::seeded()),

            users: Arc::new(InMemoryUsers::default()),
            partner_admins: Arc::new(InMemoryPartnerAdmins::default()),
        }
    }

    /// PostgreSQL stores sharing one pool. The schema must already exist.
    pub fn postgres(pool: &PgPool) -> Self {
        Self {
            events: Arc::new(PgKeyedStore::<Event>::new(pool.clone())),
            partners: Arc::new(PgKeyedStore::<Partner>::new(pool.clone())),
            partner_documents: Arc::new(PgKeyedStore::<PartnerDocument>::new(pool.clone())),
            sponsors: Arc::new(PgKeyedStore::<Sponsor>::new(pool.clone())),
            waivers: Arc::new(PgKeyedStore::<Waiver>::new(pool.clone())),
            job_opportunities: Arc::new(PgKeyedStore::<JobOpportunity>::new(pool.clone())),
            teams: Arc::new(PgKeyedStore::<Team>::new(pool.clone())),
            community_contacts: Arc::new(PgKeyedStore::<CommunityContact>::new(pool.clone())),
            community_notes: Arc::new(PgKeyedStore::<CommunityNote>::new(pool.clone())),
            notification_preferences: Arc::new(PgKeyedStore::<UserNotificationPreference>::new(pool.clone())),

            event_types: Arc::new(PgLookupStore::<EventType>::new(pool.clone())),
            event_statuses: Arc::new(PgLookupStore::<EventStatus>::new(pool.clone())),
            partner_types: Arc::new(PgLookupStore::<PartnerType>::new(pool.clone())),
            partner_statuses: Arc::new(PgLookupStore::<PartnerStatus>::new(pool.clone())),
            service_types: Arc::new(PgLookupStore::<ServiceType>::new(pool.clone())),
            invitation_statuses: Arc::new(PgLookupStore::<InvitationStatus>::new(pool.clone())),

            users: Arc::new(PgUserRepository::new(pool.clone())),
            partner_admins: Arc::new(PgPartnerAdminRepository::new(pool.clone())),
        }
    }
}

/// Everything the router needs, assembled once at startup.
#[derive(Clone)]
pub struct AppState {
    pub stores: Stores,
    pub services: Services,
    pub keys: Arc<JwtKeys>,
    /// Present when running against PostgreSQL; used by the health check.
    pub database: Option<DatabaseManager>,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(
        stores: Stores,
        keys: JwtKeys,
        telemetry: Arc<dyn Telemetry>,
        database: Option<DatabaseManager>,
        request_timeout: Duration,
    ) -> Self {
        let services = Services {
            authorizer: Arc::new(PolicyAuthorizer::new(
                stores.users.clone(),
                stores.partner_admins.clone(),
            )),
            telemetry,
            users: stores.users.clone(),
        };

        Self {
            stores,
            services,
            keys: Arc::new(keys),
            database,
            request_timeout,
        }
    }
}
