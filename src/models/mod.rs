pub mod community;
pub mod event;
pub mod keyed;
pub mod lookup;
pub mod notification;
pub mod partner;
pub mod user;
pub mod volunteering;
pub mod waiver;

pub use community::{CommunityContact, CommunityNote};
pub use event::Event;
pub use keyed::{now, Audit, KeyedModel};
pub use lookup::{
    EventStatus, EventType, InvitationStatus, LookupModel, PartnerStatus, PartnerType, ServiceType,
};
pub use notification::UserNotificationPreference;
pub use partner::{Partner, PartnerDocument, Sponsor};
pub use user::User;
pub use volunteering::{JobOpportunity, Team};
pub use waiver::Waiver;

pub(crate) fn default_true() -> bool {
    true
}
