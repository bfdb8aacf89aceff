//! Configuration manager for tutormarket.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::FromRef;
use axum::http::HeaderName;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::AppState;

const DEFAULT_CONFIG_PATH: &str = "config.yaml";
const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DEFAULT_IDENTITY_HEADER: &str = "x-user-id";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Instance name.
    pub name: String,
    /// Public URL of current instance.
    pub url: String,
    /// Socket address the HTTP server binds to.
    #[serde(skip_serializing)]
    pub address: String,
    /// Expose Prometheus metrics on `/metrics`.
    #[serde(skip_serializing)]
    pub metrics: bool,
    version: String,
    #[serde(skip)]
    path: PathBuf,
    /// Related to SQLite configuration.
    #[serde(skip_serializing)]
    pub database: Database,
    /// Related to the upstream identity provider.
    #[serde(skip_serializing)]
    pub identity: Identity,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_owned(),
            url: "http://localhost:8888/".to_owned(),
            address: "0.0.0.0:8888".to_owned(),
            metrics: true,
            version: VERSION.to_owned(),
            path: PathBuf::default(),
            database: Database::default(),
            identity: Identity::default(),
        }
    }
}

/// SQLite configuration.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Database {
    /// Connection string, e.g. `sqlite://tutormarket.db`.
    pub url: String,
    /// Maximum pool connections.
    pub pool_size: u32,
}

impl Default for Database {
    fn default() -> Self {
        Self {
            url: crate::database::DEFAULT_DATABASE_URL.to_owned(),
            pool_size: crate::database::DEFAULT_POOL_SIZE,
        }
    }
}

/// Identity provider configuration.
///
/// The provider authenticates callers upstream and forwards the user id in
/// a trusted header.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Identity {
    pub header: String,
}

impl Default for Identity {
    fn default() -> Self {
        Self {
            header: DEFAULT_IDENTITY_HEADER.to_owned(),
        }
    }
}

impl Identity {
    /// Header carrying the user id, falling back to `x-user-id` when the
    /// configured name is not a valid header name.
    pub fn header_name(&self) -> HeaderName {
        HeaderName::try_from(self.header.to_lowercase()).unwrap_or_else(|err| {
            tracing::warn!(header = %self.header, error = %err, "invalid identity header, using default");
            HeaderName::from_static(DEFAULT_IDENTITY_HEADER)
        })
    }
}

impl FromRef<AppState> for Arc<Configuration> {
    fn from_ref(state: &AppState) -> Arc<Configuration> {
        Arc::clone(&state.config)
    }
}

impl Configuration {
    pub fn path(mut self, path: PathBuf) -> Self {
        self.path = path;
        self
    }

    /// Normalizes a URL string by ensuring it starts with a valid scheme
    /// (`http` or `https`).
    fn normalize_url(&self, url: &str) -> Result<String, url::ParseError> {
        let url_with_scheme =
            if url.starts_with("http://") || url.starts_with("https://") {
                url.to_string()
            } else {
                format!("https://{url}")
            };

        let parsed_url = Url::parse(&url_with_scheme)?;
        Ok(parsed_url.to_string())
    }

    /// Reads the `config.yaml` file from the specified path or the default
    /// location.
    pub fn read(self) -> Result<Arc<Self>, url::ParseError> {
        let file_path = if self.path.is_file() {
            &self.path
        } else {
            &Path::new(DEFAULT_CONFIG_PATH).to_path_buf()
        };

        match File::open(file_path) {
            Ok(file) => {
                let mut config: Configuration =
                    match serde_yaml::from_reader(file) {
                        Ok(config) => config,
                        Err(err) => {
                            return Ok(Arc::new(self.error(err)));
                        },
                    };

                config.version = VERSION.to_owned();
                config.url = self.normalize_url(&config.url)?;

                Ok(Arc::new(config))
            },
            Err(err) => Ok(Arc::new(self.error(err))),
        }
    }

    /// Return a default configuration as fallback.
    fn error(&self, err: impl std::error::Error) -> Self {
        tracing::error!(error = %err, "`config.yaml` file not readable, using defaults");
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config: Configuration = serde_yaml::from_str(
            "name: Tutors\ndatabase:\n  url: \"sqlite::memory:\"\n",
        )
        .unwrap();

        assert_eq!(config.name, "Tutors");
        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.database.pool_size, crate::database::DEFAULT_POOL_SIZE);
        assert_eq!(config.identity.header, DEFAULT_IDENTITY_HEADER);
    }

    #[test]
    fn test_normalize_url() {
        let config = Configuration::default();
        assert_eq!(
            config.normalize_url("tutors.example.com").unwrap(),
            "https://tutors.example.com/"
        );
        assert_eq!(
            config.normalize_url("http://localhost:8888").unwrap(),
            "http://localhost:8888/"
        );
    }

    #[test]
    fn test_invalid_identity_header_falls_back() {
        let identity = Identity {
            header: "not a header".into(),
        };
        assert_eq!(identity.header_name(), DEFAULT_IDENTITY_HEADER);
    }
}
