use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    auth::CredentialSource,
    domain::{Event, EventPatch, JoinRequest, NewEvent, Viewer},
    error::{AppError, Result},
    listing::{sort_by_created_desc, sort_by_event_date_asc, EventFilter},
    participation::{append_participant, has_joined},
    repository::EventRepository,
};

/// In-process stand-in for the events API, for tests.
///
/// Applies the rules the real service owns: a credential is required for
/// mutations, only the creator may update or delete, and a user joins an
/// event at most once.
pub struct InMemoryEventRepository {
    events: RwLock<Vec<Event>>,
    identities: RwLock<HashMap<String, Viewer>>,
    credentials: Arc<dyn CredentialSource>,
}

impl InMemoryEventRepository {
    pub fn new(credentials: Arc<dyn CredentialSource>) -> Self {
        Self {
            events: RwLock::new(Vec::new()),
            identities: RwLock::new(HashMap::new()),
            credentials,
        }
    }

    /// Make `token` resolve to `viewer`, as the identity provider would.
    pub async fn register_identity(&self, token: impl Into<String>, viewer: Viewer) {
        self.identities.write().await.insert(token.into(), viewer);
    }

    /// Insert a fully formed event, bypassing validation.
    pub async fn insert(&self, event: Event) {
        self.events.write().await.push(event);
    }

    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    async fn caller(&self) -> Result<Viewer> {
        let token = self
            .credentials
            .bearer()
            .await
            .ok_or_else(|| AppError::Unauthorized("Please login to continue".to_string()))?;

        self.identities
            .read()
            .await
            .get(&token)
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Invalid or expired token".to_string()))
    }

    fn not_found(id: &str) -> AppError {
        AppError::NotFound(format!("Event {} not found", id))
    }
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn create(&self, event: NewEvent, creator: &Viewer) -> Result<Event> {
        self.caller().await?;

        let created = Event {
            id: Uuid::new_v4().to_string(),
            title: event.title,
            description: event.description,
            event_type: event.event_type,
            thumbnail: event.thumbnail,
            location: event.location,
            event_date: event.event_date,
            creator_id: creator.id.clone(),
            creator_email: Some(creator.email.clone()),
            creator_name: creator.display_name.clone(),
            creator_photo: creator.photo_url.clone(),
            created_at: Utc::now(),
            participants: Vec::new(),
        };

        self.events.write().await.push(created.clone());
        Ok(created)
    }

    async fn list_upcoming(&self, filter: &EventFilter) -> Result<Vec<Event>> {
        let now = Utc::now();
        let mut events: Vec<Event> = self
            .events
            .read()
            .await
            .iter()
            .filter(|e| e.event_date >= now && filter.matches(e))
            .cloned()
            .collect();

        sort_by_event_date_asc(&mut events);
        Ok(events)
    }

    async fn find_by_id(&self, id: &str) -> Result<Event> {
        self.events
            .read()
            .await
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(|| Self::not_found(id))
    }

    async fn join(&self, id: &str, participant: JoinRequest) -> Result<Event> {
        let caller = self.caller().await?;

        let mut events = self.events.write().await;
        let event = events
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| Self::not_found(id))?;

        append_participant(event, participant, caller.id, Utc::now())?;
        Ok(event.clone())
    }

    async fn list_created_by(&self, viewer: &Viewer) -> Result<Vec<Event>> {
        self.caller().await?;

        let mut events: Vec<Event> = self
            .events
            .read()
            .await
            .iter()
            .filter(|e| e.is_created_by(viewer))
            .cloned()
            .collect();

        sort_by_created_desc(&mut events);
        Ok(events)
    }

    async fn list_joined_by(&self, viewer: &Viewer) -> Result<Vec<Event>> {
        self.caller().await?;

        let mut events: Vec<Event> = self
            .events
            .read()
            .await
            .iter()
            .filter(|e| has_joined(e, viewer))
            .cloned()
            .collect();

        sort_by_event_date_asc(&mut events);
        Ok(events)
    }

    async fn update(&self, id: &str, patch: &EventPatch) -> Result<Event> {
        let caller = self.caller().await?;

        let mut events = self.events.write().await;
        let event = events
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| Self::not_found(id))?;

        if !event.is_created_by(&caller) {
            return Err(AppError::Unauthorized(
                "Only the creator can update this event".to_string(),
            ));
        }

        patch.apply_to(event);
        Ok(event.clone())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let caller = self.caller().await?;

        let mut events = self.events.write().await;
        let index = events
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| Self::not_found(id))?;

        if !events[index].is_created_by(&caller) {
            return Err(AppError::Unauthorized(
                "Only the creator can delete this event".to_string(),
            ));
        }

        events.remove(index);
        Ok(())
    }
}
