use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use crate::{
    domain::*,
    error::{AppError, Result},
    listing::{filter_upcoming, EventFilter, EventStats, EventStatus, JoinedFilter},
    participation::{ensure_can_join, has_joined, participant_count},
    repository::EventRepository,
    validation::{validate, validate_new_event, EventForm},
};

/// What the details view shows for one event.
#[derive(Debug, Clone, Serialize)]
pub struct EventDetails {
    pub event: Event,
    pub participant_count: usize,
    pub has_joined: bool,
    pub can_manage: bool,
    pub status: EventStatus,
}

/// The manage view: the viewer's own events plus summary cards.
#[derive(Debug, Clone, Serialize)]
pub struct ManagedEvents {
    pub events: Vec<Event>,
    pub stats: EventStats,
}

/// Event lifecycle operations as the views use them. Client-side checks
/// here gate the UI; the repository's backing service stays authoritative.
pub struct EventService {
    repo: Arc<dyn EventRepository>,
}

impl EventService {
    pub fn new(repo: Arc<dyn EventRepository>) -> Self {
        Self { repo }
    }

    /// Validate a draft and create it. Invalid drafts never reach the API.
    pub async fn create(&self, draft: &EventDraft, creator: &Viewer) -> Result<Event> {
        let event = validate_new_event(draft, Utc::now()).map_err(AppError::Validation)?;
        self.repo.create(event, creator).await
    }

    /// Submit a form, leaving its field errors populated on failure.
    pub async fn submit(&self, form: &mut EventForm, creator: &Viewer) -> Result<Event> {
        let event = form.submit(Utc::now()).map_err(AppError::Validation)?;
        self.repo.create(event, creator).await
    }

    pub async fn upcoming(&self, filter: &EventFilter) -> Result<Vec<Event>> {
        let events = self.repo.list_upcoming(filter).await?;
        Ok(filter_upcoming(events, filter))
    }

    pub async fn details(&self, id: &str, viewer: Option<&Viewer>) -> Result<EventDetails> {
        let event = self.repo.find_by_id(id).await?;
        let now = Utc::now();

        Ok(EventDetails {
            participant_count: participant_count(&event),
            has_joined: viewer.is_some_and(|v| has_joined(&event, v)),
            can_manage: viewer.is_some_and(|v| self.can_manage(&event, v)),
            status: EventStatus::of(&event, now),
            event,
        })
    }

    /// Whether `viewer` may edit or delete `event`. Advisory only; the API
    /// makes the final decision.
    pub fn can_manage(&self, event: &Event, viewer: &Viewer) -> bool {
        event.is_created_by(viewer)
    }

    /// Join `event` as `viewer`. Rejected locally with `Conflict` when the
    /// snapshot already lists the viewer.
    pub async fn join(&self, event: &Event, viewer: &Viewer) -> Result<Event> {
        ensure_can_join(event, viewer)?;
        self.repo.join(&event.id, JoinRequest::from(viewer)).await
    }

    /// Fetch then join. The two calls are independent; nothing is undone if
    /// the second one fails.
    pub async fn join_by_id(&self, id: &str, viewer: &Viewer) -> Result<Event> {
        let event = self.repo.find_by_id(id).await?;
        self.join(&event, viewer).await
    }

    pub async fn created_events(&self, viewer: &Viewer) -> Result<ManagedEvents> {
        let events = self.repo.list_created_by(viewer).await?;
        let stats = EventStats::compute(&events, Utc::now());
        Ok(ManagedEvents { events, stats })
    }

    pub async fn joined_events(&self, viewer: &Viewer, filter: JoinedFilter) -> Result<Vec<Event>> {
        let events = self.repo.list_joined_by(viewer).await?;
        Ok(filter.apply(events, Utc::now()))
    }

    /// Edit an event. The merged result must validate against the current
    /// clock, so a past event can only be saved if it is moved forward.
    pub async fn update(&self, current: &Event, patch: &EventPatch, viewer: &Viewer) -> Result<Event> {
        if patch.is_empty() {
            return Err(AppError::BadRequest("Nothing to update".to_string()));
        }

        if !self.can_manage(current, viewer) {
            return Err(AppError::Unauthorized(
                "Only the creator can update this event".to_string(),
            ));
        }

        let patch = patch.trimmed();
        let report = validate(&patch.merged_draft(current), Utc::now());
        if !report.valid {
            return Err(AppError::Validation(report.errors));
        }

        self.repo.update(&current.id, &patch).await
    }

    pub async fn delete(&self, event: &Event, viewer: &Viewer) -> Result<()> {
        if !self.can_manage(event, viewer) {
            return Err(AppError::Unauthorized(
                "Only the creator can delete this event".to_string(),
            ));
        }

        self.repo.delete(&event.id).await
    }
}
