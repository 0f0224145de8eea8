//! Command execution.
//!
//! The state machines emit [`Command`]s; the dispatcher runs each one on a
//! worker thread and posts the completion back to the UI loop as an
//! [`AppEvent`]. Completions arrive in completion order, not issue order.
//! Stale ones are discarded by the state machines, not here.

use crate::model::{FetchError, RealtimeLogEvent};
use crate::state::{AppEvent, ChannelStatus, Command};
use crate::transport::realtime::{EVENT_CONNECT, EVENT_CONNECT_ERROR, EVENT_DISCONNECT};
use crate::transport::{LogApi, Subscription, TransportClient};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Server event announcing a new captured request.
pub const EVENT_NEW_REQUEST: &str = "new_request";

/// Executes commands off the UI thread.
#[derive(Clone)]
pub struct Dispatcher {
    api: Arc<dyn LogApi>,
    events: Sender<AppEvent>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Dispatcher that runs fetches against `api` and reports on `events`.
    pub fn new(api: Arc<dyn LogApi>, events: Sender<AppEvent>) -> Self {
        Self { api, events }
    }

    /// Run each command on its own worker thread.
    pub fn execute_all(&self, commands: impl IntoIterator<Item = Command>) {
        for command in commands {
            self.execute(command);
        }
    }

    /// Run `command` on its own thread.
    pub fn execute(&self, command: Command) {
        let api = Arc::clone(&self.api);
        let events = self.events.clone();
        let label = command_label(&command);

        let spawned = std::thread::Builder::new()
            .name(format!("argus-{label}"))
            .spawn(move || {
                let event = run(api.as_ref(), command);
                // The receiver is gone only when the UI has exited.
                if events.send(event).is_err() {
                    debug!("UI loop gone; dropping completion");
                }
            });

        if let Err(e) = spawned {
            error!(error = %e, command = label, "Could not spawn fetch thread");
        }
    }
}

fn command_label(command: &Command) -> &'static str {
    match command {
        Command::FetchConfig => "config",
        Command::FetchPage(_) => "page",
        Command::FetchDetail(_) => "detail",
    }
}

/// Execute one command synchronously and wrap its result.
pub fn run(api: &dyn LogApi, command: Command) -> AppEvent {
    match command {
        Command::FetchConfig => AppEvent::ConfigFetched(api.fetch_config()),
        Command::FetchPage(request) => {
            debug!(page = request.page, token = request.token.value(), "Fetching page");
            AppEvent::PageFetched {
                token: request.token,
                result: api.fetch_page(request.page, request.page_size),
            }
        }
        Command::FetchDetail(request) => {
            debug!(log_id = %request.log_id, token = request.token.value(), "Fetching detail");
            let result = api.fetch_detail(&request.log_id);
            AppEvent::DetailFetched {
                token: request.token,
                log_id: request.log_id,
                result,
            }
        }
    }
}

/// Subscribe the dashboard to the realtime feed and channel lifecycle.
///
/// Every event is forwarded to `events`. Keep the returned guards alive for
/// as long as the dashboard is mounted.
pub fn subscribe_feed(client: &TransportClient, events: Sender<AppEvent>) -> Vec<Subscription> {
    let forward = move |event: AppEvent| {
        if events.send(event).is_err() {
            debug!("UI loop gone; dropping realtime event");
        }
    };

    let on_request = forward.clone();
    let on_connect = forward.clone();
    let on_disconnect = forward.clone();
    let on_error = forward;

    vec![
        client.subscribe(EVENT_NEW_REQUEST, move |payload| {
            match RealtimeLogEvent::from_payload(payload) {
                Ok(event) => on_request(AppEvent::Realtime(event)),
                Err(e) => {
                    let reason = FetchError::parse(EVENT_NEW_REQUEST, e.to_string()).to_string();
                    warn!(reason = %reason, "Malformed realtime payload");
                    on_request(AppEvent::RealtimeMalformed(reason));
                }
            }
        }),
        client.subscribe(EVENT_CONNECT, move |_| {
            on_connect(AppEvent::Channel(ChannelStatus::Connected));
        }),
        client.subscribe(EVENT_DISCONNECT, move |payload| {
            on_disconnect(AppEvent::Channel(ChannelStatus::Disconnected {
                reason: payload.as_str().map(str::to_string),
            }));
        }),
        client.subscribe(EVENT_CONNECT_ERROR, move |payload| {
            on_error(AppEvent::Channel(ChannelStatus::Disconnected {
                reason: payload.as_str().map(str::to_string),
            }));
        }),
    ]
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
