use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Viewer;
use crate::participation::emails_match;

/// A community-service event as returned by the events API.
///
/// The API also sends a `participantCount`; it is ignored on read and the
/// count is always projected from `participants`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub event_type: EventType,
    pub thumbnail: String,
    pub location: String,
    pub event_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_photo: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Join order is preserved.
    #[serde(default)]
    pub participants: Vec<Participant>,
}

impl Event {
    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    /// Advisory creator check. The API is the authority on who may edit.
    pub fn is_created_by(&self, viewer: &Viewer) -> bool {
        match (&self.creator_id, &viewer.id) {
            (Some(creator), Some(id)) if !creator.is_empty() => creator == id,
            _ => self
                .creator_email
                .as_deref()
                .is_some_and(|email| emails_match(email, &viewer.email)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub user_email: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_photo: Option<String>,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    Cleanup,
    Plantation,
    Donation,
    Education,
    Healthcare,
    /// Also used for types this client does not know.
    #[serde(other)]
    Other,
}

impl EventType {
    pub const ALL: [EventType; 6] = [
        EventType::Cleanup,
        EventType::Plantation,
        EventType::Donation,
        EventType::Education,
        EventType::Healthcare,
        EventType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Cleanup => "Cleanup",
            EventType::Plantation => "Plantation",
            EventType::Donation => "Donation",
            EventType::Education => "Education",
            EventType::Healthcare => "Healthcare",
            EventType::Other => "Other",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventType::ALL
            .into_iter()
            .find(|t| t.as_str() == s.trim())
            .ok_or_else(|| format!("Invalid event type: {}", s))
    }
}

/// Unvalidated form contents for a new or edited event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventDraft {
    pub title: String,
    pub description: String,
    pub event_type: String,
    pub thumbnail: String,
    pub location: String,
    pub event_date: Option<DateTime<Utc>>,
}

impl From<&Event> for EventDraft {
    fn from(event: &Event) -> Self {
        Self {
            title: event.title.clone(),
            description: event.description.clone(),
            event_type: event.event_type.as_str().to_string(),
            thumbnail: event.thumbnail.clone(),
            location: event.location.clone(),
            event_date: Some(event.event_date),
        }
    }
}

/// A draft that passed validation. Only `validation::validate_new_event`
/// builds one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub event_type: EventType,
    pub thumbnail: String,
    pub location: String,
    pub event_date: DateTime<Utc>,
}

/// Body of `POST /events`: the validated event plus the creator's identity.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    #[serde(flatten)]
    pub event: NewEvent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator_id: Option<String>,
    pub creator_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator_photo: Option<String>,
}

impl CreateEventRequest {
    pub fn new(event: NewEvent, creator: &Viewer) -> Self {
        Self {
            event,
            creator_id: creator.id.clone(),
            creator_email: creator.email.clone(),
            creator_name: creator.display_name.clone(),
            creator_photo: creator.photo_url.clone(),
        }
    }
}

/// Body of `PUT /events/:id`. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<EventType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_date: Option<DateTime<Utc>>,
}

impl EventPatch {
    pub fn is_empty(&self) -> bool {
        *self == EventPatch::default()
    }

    /// Same patch with text fields trimmed, as `validate_new_event` does
    /// for new events.
    pub fn trimmed(&self) -> EventPatch {
        let trim = |v: &Option<String>| v.as_ref().map(|s| s.trim().to_string());
        EventPatch {
            title: trim(&self.title),
            description: trim(&self.description),
            event_type: self.event_type,
            thumbnail: trim(&self.thumbnail),
            location: trim(&self.location),
            event_date: self.event_date,
        }
    }

    /// The draft an edit form would hold after applying this patch.
    pub fn merged_draft(&self, current: &Event) -> EventDraft {
        let mut draft = EventDraft::from(current);
        if let Some(title) = &self.title {
            draft.title = title.clone();
        }
        if let Some(description) = &self.description {
            draft.description = description.clone();
        }
        if let Some(event_type) = self.event_type {
            draft.event_type = event_type.as_str().to_string();
        }
        if let Some(thumbnail) = &self.thumbnail {
            draft.thumbnail = thumbnail.clone();
        }
        if let Some(location) = &self.location {
            draft.location = location.clone();
        }
        if let Some(event_date) = self.event_date {
            draft.event_date = Some(event_date);
        }
        draft
    }

    pub fn apply_to(&self, event: &mut Event) {
        if let Some(title) = &self.title {
            event.title = title.clone();
        }
        if let Some(description) = &self.description {
            event.description = description.clone();
        }
        if let Some(event_type) = self.event_type {
            event.event_type = event_type;
        }
        if let Some(thumbnail) = &self.thumbnail {
            event.thumbnail = thumbnail.clone();
        }
        if let Some(location) = &self.location {
            event.location = location.clone();
        }
        if let Some(event_date) = self.event_date {
            event.event_date = event_date;
        }
    }
}

/// Body of `POST /events/:id/join`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    pub user_name: String,
    pub user_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_photo: Option<String>,
}

impl From<&Viewer> for JoinRequest {
    fn from(viewer: &Viewer) -> Self {
        Self {
            user_name: viewer.display_name.clone().unwrap_or_default(),
            user_email: viewer.email.clone(),
            user_photo: viewer.photo_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_event_type_reads_as_other() {
        let events: Vec<Event> = serde_json::from_value(json!([
            {
                "_id": "e1",
                "title": "Five-a-side",
                "description": "Charity match",
                "eventType": "Sports",
                "thumbnail": "https://x.com/ball.jpg",
                "location": "Rec ground",
                "eventDate": "2030-05-01T10:00:00Z",
                "createdAt": "2030-04-01T10:00:00Z",
                "participantCount": 12
            },
            {
                "id": "e2",
                "title": "Clinic",
                "description": "Free checkups",
                "eventType": "Healthcare",
                "thumbnail": "https://x.com/clinic.jpg",
                "location": "Town hall",
                "eventDate": "2030-05-02T10:00:00Z",
                "createdAt": "2030-04-01T10:00:00Z"
            }
        ]))
        .unwrap();

        assert_eq!(events[0].id, "e1");
        assert_eq!(events[0].event_type, EventType::Other);
        assert_eq!(events[0].participant_count(), 0);
        assert_eq!(events[1].event_type, EventType::Healthcare);
    }

    #[test]
    fn test_patch_trimmed() {
        let patch = EventPatch {
            title: Some("  Lakeside cleanup ".to_string()),
            location: Some("\tLakeside\n".to_string()),
            event_type: Some(EventType::Cleanup),
            ..Default::default()
        };

        let trimmed = patch.trimmed();
        assert_eq!(trimmed.title.as_deref(), Some("Lakeside cleanup"));
        assert_eq!(trimmed.location.as_deref(), Some("Lakeside"));
        assert_eq!(trimmed.description, None);
        assert_eq!(trimmed.event_type, Some(EventType::Cleanup));
    }
}
