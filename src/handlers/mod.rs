// Concrete controllers. Generic resources go through `keyed` and `lookups`;
// the rest are hand-written on top of the dispatch functions.
pub mod community;
pub mod events;
pub mod keyed;
pub mod lookups;
pub mod notification_preferences;
pub mod partners;
pub mod waivers;
