//! Controller building blocks: shared collaborators, identity-aware
//! authorization, and the generic keyed and lookup dispatchers.

pub mod base;
pub mod extract;
pub mod keyed;
pub mod lookup;
pub mod outcome;
pub mod secure;

pub use base::{Collaborators, Services};
pub use extract::{Body, PathParam};
pub use keyed::{KeyedCollaborators, KeyedPolicies, KeyedRoutes};
pub use lookup::{lookup_routes, LookupCollaborators};
pub use outcome::Outcome;
pub use secure::SecureScope;
