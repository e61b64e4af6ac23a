//! Client-side checks run before an event is submitted.
//!
//! Everything here is a pure function of the draft and the supplied clock
//! reading; nothing touches the network.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use validator::ValidateUrl;

use crate::domain::{Event, EventDraft, EventType, NewEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EventField {
    Title,
    Description,
    EventType,
    Thumbnail,
    Location,
    EventDate,
}

impl EventField {
    pub const ALL: [EventField; 6] = [
        EventField::Title,
        EventField::Description,
        EventField::EventType,
        EventField::Thumbnail,
        EventField::Location,
        EventField::EventDate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventField::Title => "title",
            EventField::Description => "description",
            EventField::EventType => "eventType",
            EventField::Thumbnail => "thumbnail",
            EventField::Location => "location",
            EventField::EventDate => "eventDate",
        }
    }
}

impl fmt::Display for EventField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field name to message, one entry per failing field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors(BTreeMap<EventField, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: EventField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: EventField) -> bool {
        self.0.contains_key(&field)
    }

    pub fn insert(&mut self, field: EventField, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn remove(&mut self, field: EventField) -> Option<String> {
        self.0.remove(&field)
    }

    pub fn fields(&self) -> impl Iterator<Item = EventField> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EventField, &str)> + '_ {
        self.0.iter().map(|(field, msg)| (*field, msg.as_str()))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: FieldErrors,
}

/// Check one field. Returns the message to show, if any.
pub fn validate_field(draft: &EventDraft, field: EventField, now: DateTime<Utc>) -> Option<String> {
    match field {
        EventField::Title => required(&draft.title, "Event title is required"),
        EventField::Description => required(&draft.description, "Description is required"),
        EventField::Location => required(&draft.location, "Location is required"),
        EventField::EventType => {
            let raw = draft.event_type.trim();
            if raw.is_empty() {
                Some("Please select an event type".to_string())
            } else if raw.parse::<EventType>().is_err() {
                Some(format!("'{}' is not a known event type", raw))
            } else {
                None
            }
        }
        EventField::Thumbnail => {
            let url = draft.thumbnail.trim().to_string();
            if url.is_empty() {
                Some("Thumbnail URL is required".to_string())
            } else if !url.validate_url() {
                Some("Please enter a valid URL".to_string())
            } else {
                None
            }
        }
        EventField::EventDate => match draft.event_date {
            None => Some("Event date is required".to_string()),
            Some(date) if date <= now => Some("Event date must be in the future".to_string()),
            Some(_) => None,
        },
    }
}

fn required(value: &str, message: &str) -> Option<String> {
    value.trim().is_empty().then(|| message.to_string())
}

/// Run every rule and collect all violations.
pub fn validate(draft: &EventDraft, now: DateTime<Utc>) -> ValidationReport {
    let mut errors = FieldErrors::new();
    for field in EventField::ALL {
        if let Some(message) = validate_field(draft, field, now) {
            errors.insert(field, message);
        }
    }

    ValidationReport {
        valid: errors.is_empty(),
        errors,
    }
}

/// Validate and convert into the typed payload sent to the API.
pub fn validate_new_event(draft: &EventDraft, now: DateTime<Utc>) -> Result<NewEvent, FieldErrors> {
    let report = validate(draft, now);
    if !report.valid {
        return Err(report.errors);
    }

    let (Ok(event_type), Some(event_date)) = (draft.event_type.parse::<EventType>(), draft.event_date)
    else {
        // validate() already rejected both of these
        return Err(report.errors);
    };

    Ok(NewEvent {
        title: draft.title.trim().to_string(),
        description: draft.description.trim().to_string(),
        event_type,
        thumbnail: draft.thumbnail.trim().to_string(),
        location: draft.location.trim().to_string(),
        event_date,
    })
}

/// A single edit to one form field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldEdit {
    Title(String),
    Description(String),
    EventType(String),
    Thumbnail(String),
    Location(String),
    EventDate(Option<DateTime<Utc>>),
}

impl FieldEdit {
    pub fn field(&self) -> EventField {
        match self {
            FieldEdit::Title(_) => EventField::Title,
            FieldEdit::Description(_) => EventField::Description,
            FieldEdit::EventType(_) => EventField::EventType,
            FieldEdit::Thumbnail(_) => EventField::Thumbnail,
            FieldEdit::Location(_) => EventField::Location,
            FieldEdit::EventDate(_) => EventField::EventDate,
        }
    }
}

/// Draft plus the errors currently shown next to each field.
///
/// Editing a field that has an error re-checks that field alone. Errors on
/// fields the user has not touched stay until the next full submit.
#[derive(Debug, Clone, Default)]
pub struct EventForm {
    draft: EventDraft,
    errors: FieldErrors,
}

impl EventForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_draft(draft: EventDraft) -> Self {
        Self {
            draft,
            errors: FieldErrors::new(),
        }
    }

    pub fn from_event(event: &Event) -> Self {
        Self::from_draft(EventDraft::from(event))
    }

    pub fn draft(&self) -> &EventDraft {
        &self.draft
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn edit(&mut self, edit: FieldEdit, now: DateTime<Utc>) {
        let field = edit.field();
        match edit {
            FieldEdit::Title(v) => self.draft.title = v,
            FieldEdit::Description(v) => self.draft.description = v,
            FieldEdit::EventType(v) => self.draft.event_type = v,
            FieldEdit::Thumbnail(v) => self.draft.thumbnail = v,
            FieldEdit::Location(v) => self.draft.location = v,
            FieldEdit::EventDate(v) => self.draft.event_date = v,
        }

        if self.errors.contains(field) {
            match validate_field(&self.draft, field, now) {
                Some(message) => self.errors.insert(field, message),
                None => {
                    self.errors.remove(field);
                }
            }
        }
    }

    /// Full validation. On failure the form keeps every error for display.
    pub fn submit(&mut self, now: DateTime<Utc>) -> Result<NewEvent, FieldErrors> {
        match validate_new_event(&self.draft, now) {
            Ok(event) => {
                self.errors = FieldErrors::new();
                Ok(event)
            }
            Err(errors) => {
                self.errors = errors.clone();
                Err(errors)
            }
        }
    }
}
