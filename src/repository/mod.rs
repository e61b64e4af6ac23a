use async_trait::async_trait;

use crate::domain::*;
use crate::error::Result;
use crate::listing::EventFilter;

pub mod http_event_repository;
#[cfg(any(test, feature = "test-utils"))]
pub mod in_memory_event_repository;

pub use http_event_repository::HttpEventRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use in_memory_event_repository::InMemoryEventRepository;

/// Remote event store. Every call is attempted at most once; retrying is
/// left to the caller.
#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn create(&self, event: NewEvent, creator: &Viewer) -> Result<Event>;
    async fn list_upcoming(&self, filter: &EventFilter) -> Result<Vec<Event>>;
    async fn find_by_id(&self, id: &str) -> Result<Event>;
    async fn join(&self, id: &str, participant: JoinRequest) -> Result<Event>;
    /// Newest first by creation time.
    async fn list_created_by(&self, viewer: &Viewer) -> Result<Vec<Event>>;
    /// Soonest first by event date.
    async fn list_joined_by(&self, viewer: &Viewer) -> Result<Vec<Event>>;
    async fn update(&self, id: &str, patch: &EventPatch) -> Result<Event>;
    async fn delete(&self, id: &str) -> Result<()>;
}
