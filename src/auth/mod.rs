use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::Viewer;
use crate::error::{AppError, Result};

/// Read side of the identity provider's credential.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Bearer token for the signed-in user, if any.
    async fn bearer(&self) -> Option<String>;
}

/// Holds the current bearer token and viewer.
///
/// The identity collaborator calls [`CredentialStore::sign_in`] and
/// [`CredentialStore::sign_out`]; repositories only read through
/// [`CredentialSource`].
#[derive(Default)]
pub struct CredentialStore {
    session: RwLock<Option<StoredSession>>,
}

struct StoredSession {
    token: String,
    viewer: Option<Viewer>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that starts signed in, e.g. from a configured token.
    pub fn with_token(token: impl Into<String>, viewer: Option<Viewer>) -> Self {
        let token = token.into();
        let session = (!token.trim().is_empty()).then(|| StoredSession {
            token: token.trim().to_string(),
            viewer,
        });
        Self {
            session: RwLock::new(session),
        }
    }

    pub async fn sign_in(&self, token: impl Into<String>, viewer: Viewer) {
        let mut session = self.session.write().await;
        *session = Some(StoredSession {
            token: token.into(),
            viewer: Some(viewer),
        });
        tracing::debug!("Credential stored");
    }

    pub async fn sign_out(&self) {
        let mut session = self.session.write().await;
        if session.take().is_some() {
            tracing::debug!("Credential cleared");
        }
    }

    pub async fn current_viewer(&self) -> Option<Viewer> {
        self.session
            .read()
            .await
            .as_ref()
            .and_then(|s| s.viewer.clone())
    }

    pub async fn is_signed_in(&self) -> bool {
        self.session.read().await.is_some()
    }

    /// The viewer to act as, or why there is none. A token without a
    /// viewer identity is a configuration problem, not a missing login.
    pub async fn require_viewer(&self, action: &str) -> Result<Viewer> {
        match self.session.read().await.as_ref() {
            None => Err(AppError::Unauthorized(format!("Please login to {}", action))),
            Some(StoredSession { viewer: None, .. }) => Err(AppError::Config(format!(
                "A token is configured but no viewer identity; set viewer.email to {}",
                action
            ))),
            Some(StoredSession {
                viewer: Some(viewer),
                ..
            }) => Ok(viewer.clone()),
        }
    }
}

#[async_trait]
impl CredentialSource for CredentialStore {
    async fn bearer(&self) -> Option<String> {
        self.session.read().await.as_ref().map(|s| s.token.clone())
    }
}
