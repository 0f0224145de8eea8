//! Transport to the log server.
//!
//! Request/response fetches go through the [`LogApi`] trait so the state
//! machines and the shell can be driven by a fake in tests. The realtime
//! channel is shared: [`TransportClient::connect`] starts it at most once,
//! and every view subscribes through the same registry.

pub mod dispatch;
pub mod endpoints;
pub mod realtime;
pub mod rest;
pub mod socketio;

pub use dispatch::{subscribe_feed, Dispatcher};
pub use endpoints::{EndpointError, EndpointSettings, Endpoints, Target};
pub use realtime::{ChannelSettings, RealtimeChannel, Subscription, SubscriptionRegistry};
pub use rest::RestClient;

use crate::model::{FetchError, FetchedPage, LogEntryDetail, LogId, ServerConfig};
use std::sync::{Arc, OnceLock};
use tracing::{error, info};

/// Request/response operations against the log API.
pub trait LogApi: Send + Sync {
    /// `GET {base}/api/logs?page=&perPage=`
    fn fetch_page(&self, page: u32, page_size: u32) -> Result<FetchedPage, FetchError>;

    /// `GET {base}/api/logs/{logId}`
    fn fetch_detail(&self, log_id: &LogId) -> Result<LogEntryDetail, FetchError>;

    /// `GET {base}/api/logs/config`
    fn fetch_config(&self) -> Result<ServerConfig, FetchError>;
}

/// One connection context shared by the whole dashboard.
pub struct TransportClient {
    api: Arc<dyn LogApi>,
    registry: SubscriptionRegistry,
    channel_settings: Option<ChannelSettings>,
    channel: OnceLock<RealtimeChannel>,
}

impl std::fmt::Debug for TransportClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportClient")
            .field("registry", &self.registry)
            .field("channel_settings", &self.channel_settings)
            .field("connected", &self.channel.get().is_some())
            .finish()
    }
}

impl TransportClient {
    /// `channel_settings` of `None` runs without a realtime channel.
    pub fn new(api: Arc<dyn LogApi>, channel_settings: Option<ChannelSettings>) -> Self {
        Self {
            api,
            registry: SubscriptionRegistry::new(),
            channel_settings,
            channel: OnceLock::new(),
        }
    }

    /// Start the realtime channel if it is not running yet. Idempotent.
    pub fn connect(&self) -> &RealtimeChannel {
        self.channel.get_or_init(|| match &self.channel_settings {
            Some(settings) => {
                info!(url = %settings.url, "Starting realtime channel");
                RealtimeChannel::spawn(settings.clone(), self.registry.clone()).unwrap_or_else(
                    |e| {
                        error!(error = %e, "Could not start realtime thread");
                        RealtimeChannel::detached()
                    },
                )
            }
            None => RealtimeChannel::detached(),
        })
    }

    /// Register a handler on the shared channel. Drop the guard to unsubscribe.
    #[must_use = "dropping the Subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, event: &str, handler: F) -> Subscription
    where
        F: Fn(&serde_json::Value) + Send + Sync + 'static,
    {
        self.registry.subscribe(event, handler)
    }

    /// Registry of realtime handlers, for inspection.
    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    /// Shared handle to the REST client.
    pub fn api(&self) -> Arc<dyn LogApi> {
        Arc::clone(&self.api)
    }

    /// Fetch one page of summaries.
    pub fn fetch_page(&self, page: u32, page_size: u32) -> Result<FetchedPage, FetchError> {
        self.api.fetch_page(page, page_size)
    }

    /// Fetch the full record for one entry.
    pub fn fetch_detail(&self, log_id: &LogId) -> Result<LogEntryDetail, FetchError> {
        self.api.fetch_detail(log_id)
    }

    /// Fetch the server's logger configuration.
    pub fn fetch_config(&self) -> Result<ServerConfig, FetchError> {
        self.api.fetch_config()
    }

    /// Stop the realtime channel if it was started.
    pub fn shutdown(&self) {
        if let Some(channel) = self.channel.get() {
            channel.shutdown();
        }
    }
}
