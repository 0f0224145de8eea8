//! Detail loader: single-slot holder for the expanded view of one entry.
//!
//! Each `open` replaces whatever was shown before; results for an earlier
//! `open` that arrive after a newer one are discarded by token.

use crate::model::{FetchError, LogEntryDetail, LogId};
use crate::state::token::{RequestToken, TokenSource};
use tracing::{debug, warn};

/// Issued detail fetch, to be executed by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRequest {
    /// Token the result must carry to be accepted.
    pub token: RequestToken,
    /// Record to fetch.
    pub log_id: LogId,
}

/// What the detail view renders.
#[derive(Debug, Clone, PartialEq)]
pub enum DetailState {
    /// Nothing opened yet.
    Empty,
    /// Fetch in flight.
    Loading {
        /// Record being fetched.
        log_id: LogId,
    },
    /// Full record, ready to render.
    Ready(Box<LogEntryDetail>),
    /// Fetch failed or the row cannot be inspected.
    Failed {
        /// Record that was asked for; `None` for rows without an id.
        log_id: Option<LogId>,
        /// Why the detail cannot be shown.
        error: DetailError,
    },
}

/// Reasons the detail view shows an error panel.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DetailError {
    /// The detail fetch failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// The selected row came from a realtime push without an identifier.
    #[error("This entry has no identifier yet; reload the page to inspect it")]
    MissingId,
}

/// Single-slot holder for the detail view and its scroll offset.
#[derive(Debug, Clone)]
pub struct DetailLoader {
    state: DetailState,
    visible: bool,
    tokens: TokenSource,
    latest: Option<RequestToken>,
    scroll: u16,
}

impl Default for DetailLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DetailLoader {
    /// Closed and empty.
    pub fn new() -> Self {
        Self {
            state: DetailState::Empty,
            visible: false,
            tokens: TokenSource::default(),
            latest: None,
            scroll: 0,
        }
    }

    /// Current contents of the detail view.
    pub fn state(&self) -> &DetailState {
        &self.state
    }

    /// Whether the detail view is shown over the table.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Lines scrolled past the top of the detail body.
    pub fn scroll(&self) -> u16 {
        self.scroll
    }

    /// Reveal the view in its loading state and issue the fetch.
    ///
    /// `None` means the entry has no identifier; the view opens straight
    /// into an error panel and nothing is fetched.
    pub fn open(&mut self, log_id: Option<&LogId>) -> Option<DetailRequest> {
        self.visible = true;
        self.scroll = 0;

        let Some(log_id) = log_id else {
            self.latest = None;
            self.state = DetailState::Failed {
                log_id: None,
                error: DetailError::MissingId,
            };
            return None;
        };

        let token = self.tokens.issue();
        self.latest = Some(token);
        self.state = DetailState::Loading {
            log_id: log_id.clone(),
        };
        debug!(token = token.value(), log_id = %log_id, "Detail fetch issued");
        Some(DetailRequest {
            token,
            log_id: log_id.clone(),
        })
    }

    /// Apply a completed detail fetch. Returns false if it was stale.
    pub fn resolve(
        &mut self,
        token: RequestToken,
        log_id: LogId,
        result: Result<LogEntryDetail, FetchError>,
    ) -> bool {
        if self.latest != Some(token) {
            debug!(token = token.value(), "Discarding stale detail response");
            return false;
        }

        self.state = match result {
            Ok(detail) => DetailState::Ready(Box::new(detail)),
            Err(error) => {
                warn!(log_id = %log_id, error = %error, "Detail fetch failed");
                DetailState::Failed {
                    log_id: Some(log_id),
                    error: error.into(),
                }
            }
        };
        true
    }

    /// Hide the view. The last result is kept until the next `open`.
    pub fn close(&mut self) {
        self.visible = false;
    }

    /// Scroll towards the end of the detail body.
    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_add(lines);
    }

    /// Scroll back towards the top, stopping at zero.
    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_sub(lines);
    }
}
