use serde::Deserialize;
use config::{Config, ConfigError, Environment, File};

use crate::domain::Viewer;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub api: ApiConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub viewer: Option<ViewerConfig>,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AuthConfig {
    /// Bearer token issued by the identity provider.
    pub token: Option<String>,
}

/// Identity of the signed-in user, as the identity provider reports it.
#[derive(Debug, Deserialize, Clone)]
pub struct ViewerConfig {
    pub id: Option<String>,
    pub email: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub filter: String,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Start with default values
            .set_default("api.base_url", "http://localhost:5000/api")?
            .set_default("logging.filter", "volunteerly=info")?

            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))

            // Add environment variables (with VOLUNTEERLY__ prefix, double underscore separates levels)
            .add_source(Environment::with_prefix("VOLUNTEERLY").separator("__"))

            .build()?;

        config.try_deserialize()
    }

    pub fn viewer(&self) -> Option<Viewer> {
        self.viewer.as_ref().map(|v| Viewer {
            id: v.id.clone(),
            email: v.email.clone(),
            display_name: v.display_name.clone(),
            photo_url: v.photo_url.clone(),
        })
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: "http://localhost:5000/api".to_string(),
            },
            auth: AuthConfig { token: None },
            viewer: None,
            logging: LoggingConfig {
                filter: "volunteerly=info".to_string(),
            },
        }
    }
}
