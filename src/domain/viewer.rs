use serde::{Deserialize, Serialize};

/// The user on whose behalf an operation runs, as reported by the identity
/// provider. Passed explicitly to every operation that needs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewer {
    #[serde(default)]
    pub id: Option<String>,
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default, alias = "photoURL")]
    pub photo_url: Option<String>,
}

impl Viewer {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            id: None,
            email: email.into(),
            display_name: None,
            photo_url: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_photo(mut self, url: impl Into<String>) -> Self {
        self.photo_url = Some(url.into());
        self
    }
}
