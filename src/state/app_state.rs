//! Application state and transitions.
//!
//! AppState is the root state type. It owns the feed store, the pagination
//! controller and the detail loader, and turns user actions and transport
//! completions into [`Command`]s for the shell to execute. No I/O happens
//! here; every transition is testable without a terminal or a server.

use crate::model::{
    FetchError, FetchedPage, KeyAction, LogEntryDetail, LogId, RealtimeLogEvent, ServerConfig,
};
use crate::session::Session;
use crate::state::detail::{DetailLoader, DetailRequest};
use crate::state::feed_store::{LogFeedStore, PrependOutcome, PrependPolicy};
use crate::state::pagination::{PageRequest, PaginationController};
use crate::state::token::RequestToken;
use tracing::{info, warn};

/// Side effects requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Read the server config to decide the access gate.
    FetchConfig,
    /// Fetch one page of summaries.
    FetchPage(PageRequest),
    /// Fetch one full record for the detail view.
    FetchDetail(DetailRequest),
}

/// Completions and pushes delivered to the UI loop, in completion order.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Result of [`Command::FetchConfig`].
    ConfigFetched(Result<ServerConfig, FetchError>),
    /// Result of [`Command::FetchPage`].
    PageFetched {
        /// Token of the request this answers.
        token: RequestToken,
        /// Page or the reason it failed.
        result: Result<FetchedPage, FetchError>,
    },
    /// Result of [`Command::FetchDetail`].
    DetailFetched {
        /// Token of the request this answers.
        token: RequestToken,
        /// Record that was asked for.
        log_id: LogId,
        /// Record or the reason it failed.
        result: Result<LogEntryDetail, FetchError>,
    },
    /// A decoded `new_request` push.
    Realtime(RealtimeLogEvent),
    /// A `new_request` push that could not be decoded.
    RealtimeMalformed(String),
    /// The realtime channel changed state.
    Channel(ChannelStatus),
}

/// Health of the realtime channel, shown by the live indicator.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ChannelStatus {
    /// No session established yet.
    #[default]
    Connecting,
    /// Namespace joined; pushes flow.
    Connected,
    /// Degraded to REST-only display until the channel reconnects.
    Disconnected {
        /// Last failure reported by the channel, if any.
        reason: Option<String>,
    },
}

/// Whether the dashboard may show the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessGate {
    /// Waiting for `GET /api/logs/config`.
    Checking,
    /// The table is visible.
    Open,
    /// Server requires authentication and the session flag is not set.
    LoginRequired,
}

/// Outcome of a key action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionOutcome {
    /// Side effects to execute, in order.
    pub commands: Vec<Command>,
    /// The user asked to leave.
    pub quit: bool,
}

impl ActionOutcome {
    fn none() -> Self {
        Self::default()
    }

    fn command(command: Option<Command>) -> Self {
        Self {
            commands: command.into_iter().collect(),
            quit: false,
        }
    }
}

/// Application state. Pure data, no side effects.
///
/// Transitions come from two directions:
///
/// - [`handle_action`](Self::handle_action) for key presses, which may issue
///   page or detail fetches
/// - [`apply`](Self::apply) for completions and realtime pushes, which may
///   issue follow-up fetches (the first page once the gate opens)
///
/// Realtime pushes received before the gate opens are dropped; the first
/// page fetch that follows covers them.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Visible rows and their pagination.
    pub feed: LogFeedStore,
    /// Page-change state machine.
    pub pagination: PaginationController,
    /// Detail view state.
    pub detail: DetailLoader,
    /// Whether the table may be shown.
    pub gate: AccessGate,
    /// Realtime channel health.
    pub channel: ChannelStatus,
    /// Help overlay toggled with `?`.
    pub help_visible: bool,
    /// Last realtime payload that failed to decode, for the status bar.
    pub last_malformed: Option<String>,
    selected: usize,
    authenticated: bool,
}

impl AppState {
    /// Create the state for a dashboard that has not started yet.
    ///
    /// The session flag is read once here; the access gate never consults
    /// the session again.
    pub fn new(page_size: u32, policy: PrependPolicy, session: &dyn Session) -> Self {
        Self {
            feed: LogFeedStore::new(page_size, policy),
            pagination: PaginationController::new(page_size),
            detail: DetailLoader::new(),
            gate: AccessGate::Checking,
            channel: ChannelStatus::default(),
            help_visible: false,
            last_malformed: None,
            selected: 0,
            authenticated: session.is_authenticated(),
        }
    }

    /// Commands to issue when the dashboard starts.
    pub fn start(&mut self) -> Vec<Command> {
        self.gate = AccessGate::Checking;
        vec![Command::FetchConfig]
    }

    /// Index of the highlighted row.
    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Apply one transport completion or realtime push.
    ///
    /// Only a config completion that opens the gate issues a follow-up (the
    /// first page fetch). Stale page and detail completions are discarded by
    /// their controllers.
    pub fn apply(&mut self, event: AppEvent) -> Vec<Command> {
        match event {
            AppEvent::ConfigFetched(result) => self.open_gate(result),
            AppEvent::PageFetched { token, result } => {
                self.pagination.resolve(token, result, &mut self.feed);
                self.clamp_selection();
                Vec::new()
            }
            AppEvent::DetailFetched {
                token,
                log_id,
                result,
            } => {
                self.detail.resolve(token, log_id, result);
                Vec::new()
            }
            AppEvent::Realtime(event) => {
                self.apply_realtime(event);
                Vec::new()
            }
            AppEvent::RealtimeMalformed(reason) => {
                self.last_malformed = Some(reason);
                Vec::new()
            }
            AppEvent::Channel(status) => {
                info!(status = ?status, "Realtime channel status changed");
                self.channel = status;
                Vec::new()
            }
        }
    }

    fn open_gate(&mut self, result: Result<ServerConfig, FetchError>) -> Vec<Command> {
        let requires_auth = match result {
            Ok(config) => config.authentication,
            Err(error) => {
                warn!(error = %error, "Server config unavailable; opening dashboard");
                false
            }
        };

        if requires_auth && !self.authenticated {
            info!("Server requires authentication and no session is stored");
            self.gate = AccessGate::LoginRequired;
            return Vec::new();
        }

        self.gate = AccessGate::Open;
        vec![Command::FetchPage(self.pagination.mount())]
    }

    fn apply_realtime(&mut self, event: RealtimeLogEvent) {
        // The table is not mounted behind the gate, so nothing listens yet.
        if self.gate != AccessGate::Open {
            return;
        }
        if let Some(total) = event.total {
            self.feed.note_live_total(total);
        }
        let outcome = self.feed.prepend_from_realtime(event.entry);
        // Keep the highlighted row on the same entry unless it is the live head.
        if outcome != PrependOutcome::SkippedNotFirstPage && self.selected > 0 {
            self.selected += 1;
        }
    }

    fn clamp_selection(&mut self) {
        self.selected = self.selected.min(self.feed.len().saturating_sub(1));
    }

    /// Handle one user action.
    ///
    /// `Quit` and `Help` work everywhere. Everything else needs an open gate
    /// and goes to the detail view while it is visible.
    pub fn handle_action(&mut self, action: KeyAction) -> ActionOutcome {
        match action {
            KeyAction::Quit => {
                return ActionOutcome {
                    commands: Vec::new(),
                    quit: true,
                }
            }
            KeyAction::Help => {
                self.help_visible = !self.help_visible;
                return ActionOutcome::none();
            }
            _ => {}
        }

        if self.gate != AccessGate::Open {
            return ActionOutcome::none();
        }

        if self.detail.is_visible() {
            return self.handle_detail_action(action);
        }

        match action {
            KeyAction::SelectNext => {
                if self.selected + 1 < self.feed.len() {
                    self.selected += 1;
                }
                ActionOutcome::none()
            }
            KeyAction::SelectPrev => {
                self.selected = self.selected.saturating_sub(1);
                ActionOutcome::none()
            }
            KeyAction::SelectFirst => {
                self.selected = 0;
                ActionOutcome::none()
            }
            KeyAction::SelectLast => {
                self.selected = self.feed.len().saturating_sub(1);
                ActionOutcome::none()
            }
            KeyAction::NextPage => {
                let request = self.pagination.next_page(&self.feed);
                if request.is_some() {
                    self.selected = 0;
                }
                ActionOutcome::command(request.map(Command::FetchPage))
            }
            KeyAction::PrevPage => {
                let request = self.pagination.prev_page(&self.feed);
                if request.is_some() {
                    self.selected = 0;
                }
                ActionOutcome::command(request.map(Command::FetchPage))
            }
            KeyAction::Reload => {
                ActionOutcome::command(Some(Command::FetchPage(self.pagination.reload())))
            }
            KeyAction::OpenDetail => {
                let Some(entry) = self.feed.get(self.selected) else {
                    return ActionOutcome::none();
                };
                let log_id = entry.log_id().cloned();
                let request = self.detail.open(log_id.as_ref());
                ActionOutcome::command(request.map(Command::FetchDetail))
            }
            KeyAction::Close => {
                self.help_visible = false;
                ActionOutcome::none()
            }
            KeyAction::DetailScrollDown
            | KeyAction::DetailScrollUp
            | KeyAction::Help
            | KeyAction::Quit => ActionOutcome::none(),
        }
    }

    fn handle_detail_action(&mut self, action: KeyAction) -> ActionOutcome {
        match action {
            KeyAction::Close | KeyAction::OpenDetail => self.detail.close(),
            KeyAction::DetailScrollDown | KeyAction::SelectNext => self.detail.scroll_down(1),
            KeyAction::DetailScrollUp | KeyAction::SelectPrev => self.detail.scroll_up(1),
            KeyAction::NextPage => self.detail.scroll_down(10),
            KeyAction::PrevPage => self.detail.scroll_up(10),
            _ => {}
        }
        ActionOutcome::none()
    }
}

#[cfg(test)]
#[path = "app_state_tests.rs"]
mod tests;
