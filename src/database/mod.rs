pub mod keyed_store;
pub mod lookup_store;
pub mod manager;
pub mod memory;
pub mod schema;
pub mod users;

pub use keyed_store::PgKeyedStore;
pub use lookup_store::PgLookupStore;
pub use manager::{DatabaseError, DatabaseManager};
pub use memory::{InMemoryKeyedStore, InMemoryLookupStore, InMemoryPartnerAdmins, InMemoryUsers};
pub use schema::ensure_schema;
pub use users::{PgPartnerAdminRepository, PgUserRepository};
