use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::{
    auth::CredentialSource,
    domain::{
        ApiEnvelope, ApiErrorBody, CreateEventRequest, Event, EventPatch, JoinRequest, NewEvent,
        Viewer,
    },
    error::{AppError, Result},
    listing::{sort_by_created_desc, sort_by_event_date_asc, EventFilter},
    participation::ensure_joinable_email,
    repository::EventRepository,
};

/// Whether a call may go out without a bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Public,
    Authenticated,
}

/// [`EventRepository`] backed by the REST events API.
pub struct HttpEventRepository {
    client: Client,
    base_url: String,
    credentials: Arc<dyn CredentialSource>,
}

impl HttpEventRepository {
    pub fn new(base_url: impl Into<String>, credentials: Arc<dyn CredentialSource>) -> Self {
        Self::with_client(Client::new(), base_url, credentials)
    }

    pub fn with_client(
        client: Client,
        base_url: impl Into<String>,
        credentials: Arc<dyn CredentialSource>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            credentials,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn event_path(id: &str) -> String {
        format!("/events/{}", urlencoding::encode(id))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.url(path))
    }

    /// Attach the credential, send, and unwrap the response envelope.
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        access: Access,
        action: &str,
    ) -> Result<ApiEnvelope<T>> {
        let token = self.credentials.bearer().await;
        let authenticated = token.is_some();
        let request = match token {
            Some(token) => request.bearer_auth(token),
            None if access == Access::Authenticated => {
                tracing::warn!("Refusing to {} without a credential", action);
                return Err(AppError::Unauthorized(format!(
                    "Please login to {}",
                    action
                )));
            }
            None => request,
        };

        tracing::debug!(action, authenticated, "Sending events API request");

        let response = request.send().await.map_err(|e| {
            tracing::warn!("Events API request to {} failed: {}", action, e);
            AppError::from(e)
        })?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .ok()
                .and_then(ApiErrorBody::into_message);
            tracing::warn!(
                "Events API rejected {}: {} {}",
                action,
                status,
                message.as_deref().unwrap_or("")
            );
            return Err(AppError::from_status(status, message));
        }

        if body.trim().is_empty() {
            return Ok(ApiEnvelope {
                success: true,
                data: None,
                message: None,
            });
        }

        let envelope: ApiEnvelope<T> = serde_json::from_str(&body).map_err(|e| {
            tracing::warn!("Malformed events API response for {}: {}", action, e);
            AppError::from(e)
        })?;

        Ok(envelope)
    }
}

#[async_trait]
impl EventRepository for HttpEventRepository {
    async fn create(&self, event: NewEvent, creator: &Viewer) -> Result<Event> {
        let body = CreateEventRequest::new(event, creator);
        let request = self.request(Method::POST, "/events").json(&body);

        let created: Event = self
            .send(request, Access::Authenticated, "create an event")
            .await?
            .into_data()?;

        tracing::info!("Created event {} ({})", created.id, created.title);
        Ok(created)
    }

    async fn list_upcoming(&self, filter: &EventFilter) -> Result<Vec<Event>> {
        let request = self
            .request(Method::GET, "/events/upcoming")
            .query(&filter.query_pairs());

        let events = self
            .send::<Vec<Event>>(request, Access::Public, "list upcoming events")
            .await?
            .into_result()?
            .unwrap_or_default();

        Ok(events)
    }

    async fn find_by_id(&self, id: &str) -> Result<Event> {
        let request = self.request(Method::GET, &Self::event_path(id));

        self.send(request, Access::Public, "load the event")
            .await?
            .into_data()
    }

    async fn join(&self, id: &str, participant: JoinRequest) -> Result<Event> {
        ensure_joinable_email(&participant.user_email)?;

        let path = format!("{}/join", Self::event_path(id));
        let request = self.request(Method::POST, &path).json(&participant);

        let event: Event = self
            .send(request, Access::Authenticated, "join this event")
            .await?
            .into_data()?;

        tracing::info!("Joined event {}", event.id);
        Ok(event)
    }

    async fn list_created_by(&self, viewer: &Viewer) -> Result<Vec<Event>> {
        tracing::debug!("Loading events created by {}", viewer.email);
        let request = self.request(Method::GET, "/events/user/created");

        let mut events = self
            .send::<Vec<Event>>(request, Access::Authenticated, "view your events")
            .await?
            .into_result()?
            .unwrap_or_default();

        sort_by_created_desc(&mut events);
        Ok(events)
    }

    async fn list_joined_by(&self, viewer: &Viewer) -> Result<Vec<Event>> {
        tracing::debug!("Loading events joined by {}", viewer.email);
        let request = self.request(Method::GET, "/events/user/joined");

        let mut events = self
            .send::<Vec<Event>>(request, Access::Authenticated, "view your joined events")
            .await?
            .into_result()?
            .unwrap_or_default();

        sort_by_event_date_asc(&mut events);
        Ok(events)
    }

    async fn update(&self, id: &str, patch: &EventPatch) -> Result<Event> {
        let request = self.request(Method::PUT, &Self::event_path(id)).json(patch);

        let event: Event = self
            .send(request, Access::Authenticated, "update this event")
            .await?
            .into_data()?;

        tracing::info!("Updated event {}", event.id);
        Ok(event)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let request = self.request(Method::DELETE, &Self::event_path(id));

        self.send::<serde_json::Value>(request, Access::Authenticated, "delete this event")
            .await?
            .into_result()?;

        tracing::info!("Deleted event {}", id);
        Ok(())
    }
}
