//! Blocking REST client for the Argus log API.

use crate::model::wire::{DetailEnvelope, PageEnvelope};
use crate::model::{FetchError, FetchedPage, LogEntryDetail, LogId, ServerConfig};
use crate::transport::endpoints::Endpoints;
use crate::transport::LogApi;
use reqwest::blocking::Client;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error};

/// HTTP client for `{base}/api/logs*`.
#[derive(Debug, Clone)]
pub struct RestClient {
    client: Client,
    endpoints: Endpoints,
}

impl RestClient {
    /// Build the client. Fails only if the TLS backend cannot initialise.
    pub fn new(endpoints: Endpoints, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("argus/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, endpoints })
    }

    /// Endpoints this client was built for.
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// GET a URL and return status plus body text.
    fn get_text(&self, url: Url) -> Result<(StatusCode, String), FetchError> {
        debug!(url = %url, "GET");
        let response = self
            .client
            .get(url.clone())
            .header("Accept", "application/json")
            .send()
            .map_err(|e| FetchError::network(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|e| FetchError::network(e.to_string()))?;
        debug!(url = %url, status = status.as_u16(), bytes = body.len(), "Response");
        Ok((status, body))
    }

    /// GET, insist on a success status, decode JSON.
    fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        let endpoint = url.path().to_string();
        let (status, body) = self.get_text(url)?;
        if !status.is_success() {
            error!(endpoint = %endpoint, status = status.as_u16(), "Request failed");
            return Err(FetchError::status(status.as_u16(), status.to_string()));
        }
        decode(&endpoint, &body)
    }
}

/// Decode a JSON body, mapping failures to `FetchError::Parse`.
pub(crate) fn decode<T: DeserializeOwned>(endpoint: &str, body: &str) -> Result<T, FetchError> {
    serde_json::from_str(body).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        debug!(endpoint, preview = %preview, "Undecodable body");
        FetchError::parse(endpoint, e.to_string())
    })
}

impl LogApi for RestClient {
    fn fetch_page(&self, page: u32, page_size: u32) -> Result<FetchedPage, FetchError> {
        let url = self.endpoints.page_url(page, page_size);
        let endpoint = url.path().to_string();
        let envelope: PageEnvelope = self.get_json(url)?;
        envelope
            .into_page()
            .map_err(|e| FetchError::parse(endpoint, e.to_string()))
    }

    fn fetch_detail(&self, log_id: &LogId) -> Result<LogEntryDetail, FetchError> {
        let url = self.endpoints.detail_url(log_id);
        let endpoint = url.path().to_string();
        let (status, body) = self.get_text(url)?;

        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound {
                log_id: log_id.to_string(),
            });
        }
        if !status.is_success() {
            return Err(FetchError::status(status.as_u16(), status.to_string()));
        }

        let envelope: DetailEnvelope = decode(&endpoint, &body)?;
        // Some servers answer 200 with `data: null` for unknown ids.
        let record = envelope.data.ok_or_else(|| FetchError::NotFound {
            log_id: log_id.to_string(),
        })?;
        record
            .into_detail()
            .map_err(|e| FetchError::parse(endpoint, e.to_string()))
    }

    fn fetch_config(&self) -> Result<ServerConfig, FetchError> {
        self.get_json(self.endpoints.config_url().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::endpoints::EndpointSettings;

    #[test]
    fn decode_reports_endpoint_on_failure() {
        let result: Result<ServerConfig, _> = decode("/logs/api/logs/config", "<html>");
        match result {
            Err(FetchError::Parse { endpoint, .. }) => {
                assert_eq!(endpoint, "/logs/api/logs/config");
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn decode_accepts_config_body() {
        let config: ServerConfig = decode("/x", r#"{"authentication": true}"#).unwrap();
        assert!(config.authentication);
    }

    #[test]
    fn unreachable_server_is_network_error() {
        // Port 9 (discard) on localhost is closed in test environments.
        let settings = EndpointSettings {
            server_url: Some("http://127.0.0.1:9".to_string()),
            ..EndpointSettings::default()
        };
        let endpoints = Endpoints::resolve(&settings).unwrap();
        let client = RestClient::new(endpoints, Duration::from_secs(2)).unwrap();

        let result = client.fetch_page(1, 10);
        assert!(
            matches!(result, Err(FetchError::Network { status: None, .. })),
            "expected network error, got {:?}",
            result
        );
    }
}
