pub mod event_service;

use std::sync::Arc;

use crate::auth::CredentialStore;
use crate::config::Settings;
use crate::repository::{EventRepository, HttpEventRepository};

pub use event_service::{EventDetails, EventService, ManagedEvents};

pub struct ServiceContext {
    pub credentials: Arc<CredentialStore>,
    pub event_repo: Arc<dyn EventRepository>,
    pub event_service: Arc<EventService>,
}

impl ServiceContext {
    pub fn new(credentials: Arc<CredentialStore>, event_repo: Arc<dyn EventRepository>) -> Self {
        let event_service = Arc::new(EventService::new(event_repo.clone()));

        Self {
            credentials,
            event_repo,
            event_service,
        }
    }

    /// Wire the HTTP repository from settings.
    pub fn from_settings(settings: &Settings) -> Self {
        let credentials = Arc::new(match &settings.auth.token {
            Some(token) => CredentialStore::with_token(token.clone(), settings.viewer()),
            None => CredentialStore::new(),
        });
        let event_repo = Arc::new(HttpEventRepository::new(
            settings.api.base_url.clone(),
            credentials.clone(),
        ));

        Self::new(credentials, event_repo)
    }
}
