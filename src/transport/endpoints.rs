//! Endpoint resolution.
//!
//! The REST base and the realtime URL are derived once at startup from the
//! deployment target. Development talks to a local server; production talks
//! to the origin the logger is mounted on.

use crate::model::LogId;
use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;

/// Origin used by the development target unless overridden.
pub const DEV_ORIGIN: &str = "http://localhost:5000";
/// Path the REST API is mounted under by default.
pub const DEFAULT_MOUNT_PATH: &str = "/logs/";
/// Path of the Socket.IO endpoint by default.
pub const DEFAULT_REALTIME_PATH: &str = "/argus-websocket-server/";

/// Deployment variant the dashboard talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    /// Local server at `localhost:5000`.
    #[default]
    Development,
    /// Deployed server named by `server_url`.
    Production,
}

impl std::str::FromStr for Target {
    type Err = EndpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Target::Development),
            "production" | "prod" => Ok(Target::Production),
            other => Err(EndpointError::UnknownTarget(other.to_string())),
        }
    }
}

/// Reasons endpoint resolution fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndpointError {
    /// The server URL does not parse.
    #[error("Invalid server URL {url:?}: {reason}")]
    InvalidUrl {
        /// The URL as configured.
        url: String,
        /// Parser message.
        reason: String,
    },

    /// Production was selected without a server URL.
    #[error("The production target needs a server URL (set server_url or --server)")]
    MissingServerUrl,

    /// The server URL is neither http nor https.
    #[error("Unsupported URL scheme {0:?}; expected http or https")]
    UnsupportedScheme(String),

    /// The target name is not recognised.
    #[error("Unknown target {0:?}; expected development or production")]
    UnknownTarget(String),
}

/// Inputs to endpoint resolution, taken from the resolved config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointSettings {
    /// Which server to talk to.
    pub target: Target,
    /// Base URL of the server; required for production.
    pub server_url: Option<String>,
    /// Path the logger is mounted under, e.g. `/logs/`.
    pub mount_path: String,
    /// Path of the realtime endpoint on the server.
    pub realtime_path: String,
}

impl Default for EndpointSettings {
    fn default() -> Self {
        Self {
            target: Target::Development,
            server_url: None,
            mount_path: DEFAULT_MOUNT_PATH.to_string(),
            realtime_path: DEFAULT_REALTIME_PATH.to_string(),
        }
    }
}

/// Fully resolved URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    rest_base: Url,
    logs_url: Url,
    config_url: Url,
    realtime_url: Url,
}

impl Endpoints {
    /// Build the REST and realtime URLs for `settings`.
    pub fn resolve(settings: &EndpointSettings) -> Result<Self, EndpointError> {
        let origin_raw = match (settings.target, settings.server_url.as_deref()) {
            (_, Some(url)) => url,
            (Target::Development, None) => DEV_ORIGIN,
            (Target::Production, None) => return Err(EndpointError::MissingServerUrl),
        };

        let origin = Url::parse(origin_raw).map_err(|e| EndpointError::InvalidUrl {
            url: origin_raw.to_string(),
            reason: e.to_string(),
        })?;
        let ws_scheme = match origin.scheme() {
            "http" => "ws",
            "https" => "wss",
            other => return Err(EndpointError::UnsupportedScheme(other.to_string())),
        };

        let mut rest_base = origin.clone();
        rest_base.set_path(&directory_path(&settings.mount_path));
        rest_base.set_query(None);
        rest_base.set_fragment(None);

        let logs_url = join(&rest_base, "api/logs")?;
        let config_url = join(&rest_base, "api/logs/config")?;

        let mut realtime_url = origin;
        realtime_url
            .set_scheme(ws_scheme)
            .map_err(|_| EndpointError::UnsupportedScheme(ws_scheme.to_string()))?;
        realtime_url.set_path(&directory_path(&settings.realtime_path));
        realtime_url.set_query(Some("EIO=4&transport=websocket"));
        realtime_url.set_fragment(None);

        Ok(Self {
            rest_base,
            logs_url,
            config_url,
            realtime_url,
        })
    }

    /// Base URL that REST paths are joined onto.
    pub fn rest_base(&self) -> &Url {
        &self.rest_base
    }

    /// `{base}/api/logs?page={page}&perPage={per_page}`
    pub fn page_url(&self, page: u32, per_page: u32) -> Url {
        let mut url = self.logs_url.clone();
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("perPage", &per_page.to_string());
        url
    }

    /// `{base}/api/logs/{logId}`, with the identifier percent-encoded.
    pub fn detail_url(&self, log_id: &LogId) -> Url {
        let mut url = self.logs_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(log_id.as_str());
        }
        url
    }

    /// `{base}/api/logs/config`
    pub fn config_url(&self) -> &Url {
        &self.config_url
    }

    /// Socket.IO websocket URL.
    pub fn realtime_url(&self) -> &Url {
        &self.realtime_url
    }
}

/// Normalise a configured path to `/segment/.../`.
fn directory_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}/")
    }
}

fn join(base: &Url, relative: &str) -> Result<Url, EndpointError> {
    base.join(relative).map_err(|e| EndpointError::InvalidUrl {
        url: format!("{base}{relative}"),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn production(url: &str) -> EndpointSettings {
        EndpointSettings {
            target: Target::Production,
            server_url: Some(url.to_string()),
            ..EndpointSettings::default()
        }
    }

    #[test]
    fn development_defaults_to_localhost() {
        let endpoints = Endpoints::resolve(&EndpointSettings::default()).unwrap();
        assert_eq!(endpoints.rest_base().as_str(), "http://localhost:5000/logs/");
        assert_eq!(
            endpoints.realtime_url().as_str(),
            "ws://localhost:5000/argus-websocket-server/?EIO=4&transport=websocket"
        );
    }

    #[test]
    fn production_uses_server_origin() {
        let endpoints = Endpoints::resolve(&production("https://api.example.com")).unwrap();
        assert_eq!(
            endpoints.page_url(2, 10).as_str(),
            "https://api.example.com/logs/api/logs?page=2&perPage=10"
        );
        assert_eq!(endpoints.realtime_url().scheme(), "wss");
    }

    #[test]
    fn production_without_server_fails() {
        let settings = EndpointSettings {
            target: Target::Production,
            ..EndpointSettings::default()
        };
        assert_eq!(
            Endpoints::resolve(&settings),
            Err(EndpointError::MissingServerUrl)
        );
    }

    #[test]
    fn mount_path_is_normalised() {
        let settings = EndpointSettings {
            mount_path: "horus".to_string(),
            server_url: Some("http://localhost:7000".to_string()),
            ..EndpointSettings::default()
        };
        let endpoints = Endpoints::resolve(&settings).unwrap();
        assert_eq!(
            endpoints.config_url().as_str(),
            "http://localhost:7000/horus/api/logs/config"
        );
    }

    #[test]
    fn root_mount_path() {
        let settings = EndpointSettings {
            mount_path: "/".to_string(),
            ..EndpointSettings::default()
        };
        let endpoints = Endpoints::resolve(&settings).unwrap();
        assert_eq!(
            endpoints.page_url(1, 10).as_str(),
            "http://localhost:5000/api/logs?page=1&perPage=10"
        );
    }

    #[test]
    fn detail_url_encodes_identifier() {
        let endpoints = Endpoints::resolve(&EndpointSettings::default()).unwrap();
        let id = LogId::new("a b?c").unwrap();
        assert_eq!(
            endpoints.detail_url(&id).as_str(),
            "http://localhost:5000/logs/api/logs/a%20b%3Fc"
        );
    }

    #[test]
    fn unsupported_scheme_is_rejected() {
        assert!(matches!(
            Endpoints::resolve(&production("ftp://example.com")),
            Err(EndpointError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn target_parses_short_names() {
        assert_eq!("prod".parse::<Target>(), Ok(Target::Production));
        assert_eq!("Development".parse::<Target>(), Ok(Target::Development));
        assert!("staging".parse::<Target>().is_err());
    }
}
