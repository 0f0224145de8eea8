//! Pagination controller state machine.
//!
//! Idle → Loading on mount or a page change; Loading → Loaded on success,
//! Loading → Error on failure; Error → Loading on the next user page change.
//!
//! Every request carries a monotonically increasing [`RequestToken`]. Only
//! the most recently issued token may write into the feed store, so a slow
//! earlier response can never overwrite a faster later one.

use crate::model::{FetchError, FetchedPage, PaginationState};
use crate::state::feed_store::LogFeedStore;
use crate::state::token::{RequestToken, TokenSource};
use tracing::{debug, info, warn};

/// Issued page fetch, to be executed by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Guard token; the completion must carry it back.
    pub token: RequestToken,
    /// 1-based page to fetch.
    pub page: u32,
    /// Rows per page.
    pub page_size: u32,
}

/// Load state shown alongside the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadPhase {
    /// Nothing requested yet.
    Idle,
    /// A fetch for `page` is in flight.
    Loading {
        /// Page being fetched.
        page: u32,
    },
    /// The latest fetch was applied to the store.
    Loaded,
    /// The previously loaded list stays on screen.
    Error {
        /// Page whose fetch failed; [`PaginationController::reload`] retries it.
        page: u32,
        /// Why it failed.
        error: FetchError,
    },
}

/// What happened to a completed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageResolution {
    /// The result was written into the store.
    Applied,
    /// A newer request was issued meanwhile; result discarded.
    Stale,
    /// The latest request failed; the phase is now [`LoadPhase::Error`].
    Failed,
}

/// Turns page-change intent into [`PageRequest`]s and applies their results.
///
/// Holds no entries itself; successful fetches are written into the
/// [`LogFeedStore`] passed to [`resolve`](Self::resolve).
#[derive(Debug, Clone)]
pub struct PaginationController {
    phase: LoadPhase,
    page_size: u32,
    tokens: TokenSource,
    latest: Option<RequestToken>,
    /// Page the user last asked for; leads the store while a fetch is in flight.
    requested_page: u32,
}

impl PaginationController {
    /// Create an idle controller. A zero page size is clamped to 1.
    pub fn new(page_size: u32) -> Self {
        Self {
            phase: LoadPhase::Idle,
            page_size: page_size.max(1),
            tokens: TokenSource::default(),
            latest: None,
            requested_page: 1,
        }
    }

    /// Current load phase.
    pub fn phase(&self) -> &LoadPhase {
        &self.phase
    }

    /// Rows requested per page.
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Page the user last asked for, or the displayed page after a failure.
    pub fn requested_page(&self) -> u32 {
        self.requested_page
    }

    /// True while the latest request is in flight.
    pub fn is_loading(&self) -> bool {
        matches!(self.phase, LoadPhase::Loading { .. })
    }

    /// Issue a fetch for `page`, superseding anything in flight.
    pub fn request_page(&mut self, page: u32) -> PageRequest {
        let page = page.max(1);
        let token = self.tokens.issue();
        self.latest = Some(token);
        self.requested_page = page;
        self.phase = LoadPhase::Loading { page };
        debug!(token = token.value(), page, "Page fetch issued");
        PageRequest {
            token,
            page,
            page_size: self.page_size,
        }
    }

    /// First fetch at mount.
    pub fn mount(&mut self) -> PageRequest {
        self.request_page(1)
    }

    /// Position used for next/prev: the requested page against the known total.
    fn position(&self, store: &LogFeedStore) -> PaginationState {
        PaginationState::new(
            self.requested_page,
            self.page_size,
            store.pagination().total_count(),
        )
    }

    /// Next page relative to the last requested one, if the known total has it.
    pub fn next_page(&mut self, store: &LogFeedStore) -> Option<PageRequest> {
        if !self.position(store).has_next() {
            return None;
        }
        Some(self.request_page(self.requested_page.saturating_add(1)))
    }

    /// Previous page relative to the last requested one. `None` on page 1.
    pub fn prev_page(&mut self, store: &LogFeedStore) -> Option<PageRequest> {
        if !self.position(store).has_prev() {
            return None;
        }
        Some(self.request_page(self.requested_page - 1))
    }

    /// Re-request the current page. After a failure this retries the page
    /// that failed, not the one still on screen.
    pub fn reload(&mut self) -> PageRequest {
        let page = match &self.phase {
            LoadPhase::Error { page, .. } => *page,
            _ => self.requested_page,
        };
        self.request_page(page)
    }

    /// Apply a completed fetch. Stale tokens are ignored.
    pub fn resolve(
        &mut self,
        token: RequestToken,
        result: Result<FetchedPage, FetchError>,
        store: &mut LogFeedStore,
    ) -> PageResolution {
        if self.latest != Some(token) {
            debug!(
                token = token.value(),
                latest = self.latest.map(|t| t.value()),
                "Discarding stale page response"
            );
            return PageResolution::Stale;
        }

        match result {
            Ok(page) => {
                let pagination = page.pagination(self.page_size);
                info!(
                    token = token.value(),
                    page = pagination.current_page(),
                    total = pagination.total_count(),
                    count = page.entries.len(),
                    "Page loaded"
                );
                store.replace_from_fetch(page.entries, pagination);
                self.requested_page = pagination.current_page();
                self.phase = LoadPhase::Loaded;
                PageResolution::Applied
            }
            Err(error) => {
                let page = self.requested_page;
                warn!(token = token.value(), page, error = %error, "Page fetch failed");
                self.requested_page = store.pagination().current_page();
                self.phase = LoadPhase::Error { page, error };
                PageResolution::Failed
            }
        }
    }
}

#[cfg(test)]
#[path = "pagination_tests.rs"]
mod tests;
