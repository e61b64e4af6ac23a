//! Derived views over a fetched event collection: filtering, time
//! partitioning, status labels and per-view ordering. Nothing here is
//! persisted; every view is recomputed from the clock it is given.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::domain::{Event, EventType};
use crate::participation::total_participants;

/// How far ahead an upcoming event still counts as "soon".
pub const SOON_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(EventType),
}

impl CategoryFilter {
    pub fn matches(&self, event_type: EventType) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(wanted) => *wanted == event_type,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(CategoryFilter::All)
        } else {
            s.parse::<EventType>().map(CategoryFilter::Only)
        }
    }
}

/// Listing filters. The same values go to the API as query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    pub category: CategoryFilter,
    pub search: Option<String>,
}

impl EventFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(mut self, category: CategoryFilter) -> Self {
        self.category = category;
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    /// Category match plus case-insensitive substring search over title
    /// and description.
    pub fn matches(&self, event: &Event) -> bool {
        if !self.category.matches(event.event_type) {
            return false;
        }

        match self.search_term() {
            None => true,
            Some(term) => {
                let term = term.to_lowercase();
                event.title.to_lowercase().contains(&term)
                    || event.description.to_lowercase().contains(&term)
            }
        }
    }

    /// Query parameters for `GET /events/upcoming`. Wildcards are omitted.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let CategoryFilter::Only(event_type) = self.category {
            pairs.push(("eventType", event_type.as_str().to_string()));
        }
        if let Some(term) = self.search_term() {
            pairs.push(("search", term.to_string()));
        }
        pairs
    }
}

/// Keep the events matching `filter`, in their original order.
pub fn filter_upcoming(events: Vec<Event>, filter: &EventFilter) -> Vec<Event> {
    events.into_iter().filter(|e| filter.matches(e)).collect()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimePartition {
    pub upcoming: Vec<Event>,
    pub past: Vec<Event>,
}

/// Split on `now`. An event dated exactly `now` is upcoming.
pub fn partition_by_time(events: &[Event], now: DateTime<Utc>) -> TimePartition {
    let (upcoming, past): (Vec<Event>, Vec<Event>) = events
        .iter()
        .cloned()
        .partition(|event| event.event_date >= now);

    TimePartition { upcoming, past }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventStatus {
    Completed,
    Soon,
    Upcoming,
}

impl EventStatus {
    pub fn of(event: &Event, now: DateTime<Utc>) -> Self {
        classify(event.event_date, now)
    }

    pub fn label(&self) -> &'static str {
        match self {
            EventStatus::Completed => "Completed",
            EventStatus::Soon => "Soon",
            EventStatus::Upcoming => "Upcoming",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub fn classify(event_date: DateTime<Utc>, now: DateTime<Utc>) -> EventStatus {
    if event_date < now {
        EventStatus::Completed
    } else if event_date - now <= Duration::days(SOON_WINDOW_DAYS) {
        EventStatus::Soon
    } else {
        EventStatus::Upcoming
    }
}

/// Tabs on the joined-events view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JoinedFilter {
    #[default]
    All,
    Upcoming,
    Past,
}

impl JoinedFilter {
    pub fn apply(&self, events: Vec<Event>, now: DateTime<Utc>) -> Vec<Event> {
        match self {
            JoinedFilter::All => events,
            JoinedFilter::Upcoming => events.into_iter().filter(|e| e.event_date >= now).collect(),
            JoinedFilter::Past => events.into_iter().filter(|e| e.event_date < now).collect(),
        }
    }
}

impl FromStr for JoinedFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(JoinedFilter::All),
            "upcoming" => Ok(JoinedFilter::Upcoming),
            "past" | "completed" => Ok(JoinedFilter::Past),
            other => Err(format!("Invalid view: {}", other)),
        }
    }
}

/// Ordering for the "my created events" view: newest first.
pub fn sort_by_created_desc(events: &mut [Event]) {
    events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

/// Ordering for the "joined events" view: soonest first.
pub fn sort_by_event_date_asc(events: &mut [Event]) {
    events.sort_by(|a, b| a.event_date.cmp(&b.event_date));
}

/// Summary cards on the manage view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EventStats {
    pub total: usize,
    pub upcoming: usize,
    pub past: usize,
    pub total_participants: usize,
}

impl EventStats {
    pub fn compute(events: &[Event], now: DateTime<Utc>) -> Self {
        let upcoming = events.iter().filter(|e| e.event_date >= now).count();
        Self {
            total: events.len(),
            upcoming,
            past: events.len() - upcoming,
            total_participants: total_participants(events),
        }
    }
}
