use std::sync::Arc;

use crate::authorization::Authorizer;
use crate::managers::UserRepository;
use crate::middleware::AuthContext;
use crate::telemetry::Telemetry;

use super::secure::SecureScope;

/// Cross-cutting services every controller shares.
#[derive(Clone)]
pub struct Services {
    pub authorizer: Arc<dyn Authorizer>,
    pub telemetry: Arc<dyn Telemetry>,
    pub users: Arc<dyn UserRepository>,
}

impl Services {
    pub fn track_event(&self, name: &str) {
        self.telemetry.track_event(name);
    }

    pub fn scope<'a>(&'a self, auth: &'a AuthContext) -> SecureScope<'a> {
        SecureScope::new(auth, self)
    }
}

/// A controller's manager plus the shared services, handed to handlers as
/// router state. Built once when the router is assembled.
pub struct Collaborators<M: ?Sized> {
    pub manager: Arc<M>,
    pub services: Services,
}

impl<M: ?Sized> Collaborators<M> {
    pub fn new(manager: Arc<M>, services: Services) -> Self {
        Self { manager, services }
    }

    pub fn track_event(&self, name: &str) {
        self.services.track_event(name);
    }

    pub fn scope<'a>(&'a self, auth: &'a AuthContext) -> SecureScope<'a> {
        self.services.scope(auth)
    }
}

// Derived Clone would demand `M: Clone`, which trait objects are not.
impl<M: ?Sized> Clone for Collaborators<M> {
    fn clone(&self) -> Self {
        Self {
            manager: Arc::clone(&self.manager),
            services: self.services.clone(),
        }
    }
}
