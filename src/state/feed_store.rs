//! Log feed store: the visible list and its pagination metadata.
//!
//! Two un-synchronized sources write here: paginated REST results replace
//! the whole list, realtime pushes insert at the head. Those are the only
//! mutations; an inserted entry is never edited or removed in place.

use crate::model::{LogEntrySummary, PaginationState};
use serde::Deserialize;
use std::collections::VecDeque;
use tracing::{debug, warn};

/// When a realtime push is allowed into the visible list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrependPolicy {
    /// Prepend regardless of the page on screen. A non-first page then
    /// shows live entries that do not belong to it until the next fetch.
    #[default]
    Always,
    /// Only prepend while page 1 is displayed; pushes are dropped otherwise.
    FirstPageOnly,
}

/// Result of a realtime push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrependOutcome {
    /// Inserted at the head.
    Inserted,
    /// Inserted, but older than the previous head.
    InsertedOutOfOrder,
    /// Dropped by [`PrependPolicy::FirstPageOnly`].
    SkippedNotFirstPage,
}

/// Single source of truth for the table contents.
#[derive(Debug, Clone)]
pub struct LogFeedStore {
    entries: VecDeque<LogEntrySummary>,
    pagination: PaginationState,
    policy: PrependPolicy,
    ordering_violations: usize,
    live_total_hint: Option<u64>,
}

impl LogFeedStore {
    /// Empty list on page 1, as at mount.
    pub fn new(page_size: u32, policy: PrependPolicy) -> Self {
        Self {
            entries: VecDeque::new(),
            pagination: PaginationState::initial(page_size),
            policy,
            ordering_violations: 0,
            live_total_hint: None,
        }
    }

    /// Overwrite the list and pagination with one fetch result.
    ///
    /// Idempotent: replaying the same arguments yields the same state.
    pub fn replace_from_fetch(&mut self, entries: Vec<LogEntrySummary>, pagination: PaginationState) {
        debug!(
            count = entries.len(),
            page = pagination.current_page(),
            total = pagination.total_count(),
            "Replacing feed from fetch"
        );
        self.entries = VecDeque::from(entries);
        self.pagination = pagination;
    }

    /// Insert one pushed entry at the head of the list.
    ///
    /// The store assumes the realtime source delivers increasing timestamps.
    /// A push older than the current head is still inserted (the list is
    /// never reordered) but counted and logged.
    pub fn prepend_from_realtime(&mut self, entry: LogEntrySummary) -> PrependOutcome {
        if self.policy == PrependPolicy::FirstPageOnly && self.pagination.current_page() != 1 {
            debug!(
                page = self.pagination.current_page(),
                "Dropping realtime entry while off the first page"
            );
            return PrependOutcome::SkippedNotFirstPage;
        }

        let out_of_order = self
            .entries
            .front()
            .is_some_and(|head| entry.timestamp() < head.timestamp());

        if out_of_order {
            self.ordering_violations += 1;
            warn!(
                path = entry.path(),
                timestamp = %entry.timestamp(),
                violations = self.ordering_violations,
                "Realtime entry is older than the current head"
            );
        }

        self.entries.push_front(entry);

        if out_of_order {
            PrependOutcome::InsertedOutOfOrder
        } else {
            PrependOutcome::Inserted
        }
    }

    /// Remember the total the server reported alongside a push.
    ///
    /// Display only; pagination stays fetch-authoritative.
    pub fn note_live_total(&mut self, total: u64) {
        self.live_total_hint = Some(total);
    }

    /// Rows in display order, newest first.
    pub fn entries(&self) -> impl ExactSizeIterator<Item = &LogEntrySummary> + '_ {
        self.entries.iter()
    }

    /// Row at `index` in display order.
    pub fn get(&self, index: usize) -> Option<&LogEntrySummary> {
        self.entries.get(index)
    }

    /// Number of rows currently held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the page holds no rows.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pagination as of the last applied fetch.
    pub fn pagination(&self) -> PaginationState {
        self.pagination
    }

    /// How realtime pushes are admitted.
    pub fn policy(&self) -> PrependPolicy {
        self.policy
    }

    /// Pushes that arrived older than the row they were placed above.
    pub fn ordering_violations(&self) -> usize {
        self.ordering_violations
    }

    /// Total reported by the most recent push, if any.
    pub fn live_total_hint(&self) -> Option<u64> {
        self.live_total_hint
    }
}

#[cfg(test)]
#[path = "feed_store_tests.rs"]
mod tests;
