//! Tests for AppState transitions.

use super::*;
use crate::session::MemorySession;
use crate::model::{LogEntrySummary, PaginationState};
use crate::state::detail::{DetailError, DetailState};
use crate::state::pagination::LoadPhase;
use chrono::{TimeZone, Utc};

fn summary(id: &str, ts_ms: i64, status: u16) -> LogEntrySummary {
    LogEntrySummary::new(
        Some(LogId::new(id).unwrap()),
        "GET",
        format!("/{id}"),
        status,
        2.0,
        Utc.timestamp_millis_opt(ts_ms).unwrap(),
    )
    .unwrap()
}

fn page(current: u32, total: u64, count: usize) -> FetchedPage {
    FetchedPage {
        entries: (0..count)
            .map(|i| summary(&format!("p{current}e{i}"), 900 - i as i64, 200))
            .collect(),
        total_count: total,
        current_page: current,
    }
}

fn page_request(commands: &[Command]) -> PageRequest {
    match commands {
        [Command::FetchPage(req)] => *req,
        other => panic!("expected a single page fetch, got {:?}", other),
    }
}

/// Open dashboard with page 1 of 47 loaded.
fn open_state() -> AppState {
    let mut state = AppState::new(10, PrependPolicy::Always, &MemorySession::default());
    state.start();
    let commands = state.apply(AppEvent::ConfigFetched(Ok(ServerConfig::default())));
    let req = page_request(&commands);
    state.apply(AppEvent::PageFetched {
        token: req.token,
        result: Ok(page(1, 47, 10)),
    });
    state
}

#[test]
fn start_fetches_server_config() {
    let mut state = AppState::new(10, PrependPolicy::Always, &MemorySession::default());
    assert_eq!(state.start(), vec![Command::FetchConfig]);
    assert_eq!(state.gate, AccessGate::Checking);
}

#[test]
fn open_config_mounts_first_page() {
    let mut state = AppState::new(10, PrependPolicy::Always, &MemorySession::default());
    state.start();
    let commands = state.apply(AppEvent::ConfigFetched(Ok(ServerConfig {
        authentication: false,
    })));
    let req = page_request(&commands);
    assert_eq!(req.page, 1);
    assert_eq!(req.page_size, 10);
    assert_eq!(state.gate, AccessGate::Open);
}

#[test]
fn auth_required_without_session_blocks_dashboard() {
    let mut state = AppState::new(10, PrependPolicy::Always, &MemorySession::default());
    state.start();
    let commands = state.apply(AppEvent::ConfigFetched(Ok(ServerConfig {
        authentication: true,
    })));
    assert!(commands.is_empty());
    assert_eq!(state.gate, AccessGate::LoginRequired);

    let outcome = state.handle_action(KeyAction::NextPage);
    assert!(outcome.commands.is_empty());
}

#[test]
fn auth_required_with_session_opens() {
    let mut state = AppState::new(10, PrependPolicy::Always, &MemorySession::new(true));
    state.start();
    let commands = state.apply(AppEvent::ConfigFetched(Ok(ServerConfig {
        authentication: true,
    })));
    assert_eq!(commands.len(), 1);
    assert_eq!(state.gate, AccessGate::Open);
}

#[test]
fn config_failure_opens_dashboard() {
    let mut state = AppState::new(10, PrependPolicy::Always, &MemorySession::default());
    state.start();
    let commands = state.apply(AppEvent::ConfigFetched(Err(FetchError::network("refused"))));
    assert_eq!(commands.len(), 1);
    assert_eq!(state.gate, AccessGate::Open);
}

#[test]
fn first_page_sets_pagination() {
    let state = open_state();
    assert_eq!(state.feed.pagination(), PaginationState::new(1, 10, 47));
    assert_eq!(state.feed.len(), 10);
}

#[test]
fn realtime_push_prepends_error_entry() {
    let mut state = open_state();
    state.apply(AppEvent::Realtime(RealtimeLogEvent {
        entry: summary("x9", 1000, 500),
        total: Some(48),
    }));

    assert_eq!(state.feed.len(), 11);
    let head = state.feed.get(0).unwrap();
    assert_eq!(head.log_id().unwrap().as_str(), "x9");
    assert_eq!(head.status_class(), crate::model::StatusClass::Error);
    assert_eq!(state.feed.live_total_hint(), Some(48));
}

#[test]
fn realtime_push_ignored_before_gate_opens() {
    let mut state = AppState::new(10, PrependPolicy::Always, &MemorySession::default());
    state.start();
    state.apply(AppEvent::Realtime(RealtimeLogEvent {
        entry: summary("early", 1000, 200),
        total: None,
    }));
    assert!(state.feed.is_empty());
}

#[test]
fn selection_follows_entry_when_not_at_head() {
    let mut state = open_state();
    state.handle_action(KeyAction::SelectNext);
    state.handle_action(KeyAction::SelectNext);
    assert_eq!(state.selected(), 2);

    state.apply(AppEvent::Realtime(RealtimeLogEvent {
        entry: summary("new", 1000, 200),
        total: None,
    }));

    assert_eq!(state.selected(), 3);
    assert_eq!(state.feed.get(state.selected()).unwrap().path(), "/p1e2");
}

#[test]
fn rapid_page_changes_keep_latest() {
    let mut state = open_state();
    let r2 = page_request(&state.handle_action(KeyAction::NextPage).commands);
    let r3 = page_request(&state.handle_action(KeyAction::NextPage).commands);

    state.apply(AppEvent::PageFetched {
        token: r3.token,
        result: Ok(page(3, 47, 10)),
    });
    state.apply(AppEvent::PageFetched {
        token: r2.token,
        result: Ok(page(2, 47, 10)),
    });

    assert_eq!(state.feed.pagination().current_page(), 3);
    assert_eq!(state.feed.get(0).unwrap().path(), "/p3e0");
}

#[test]
fn page_error_is_surfaced_not_propagated() {
    let mut state = open_state();
    let r2 = page_request(&state.handle_action(KeyAction::NextPage).commands);
    state.apply(AppEvent::PageFetched {
        token: r2.token,
        result: Err(FetchError::status(502, "502 Bad Gateway")),
    });

    assert!(matches!(state.pagination.phase(), LoadPhase::Error { .. }));
    assert_eq!(state.feed.len(), 10);
}

#[test]
fn open_detail_requests_selected_entry() {
    let mut state = open_state();
    state.handle_action(KeyAction::SelectNext);
    let outcome = state.handle_action(KeyAction::OpenDetail);
    match outcome.commands.as_slice() {
        [Command::FetchDetail(req)] => assert_eq!(req.log_id.as_str(), "p1e1"),
        other => panic!("expected detail fetch, got {:?}", other),
    }
    assert!(state.detail.is_visible());
}

#[test]
fn detail_not_found_shows_error() {
    let mut state = open_state();
    let outcome = state.handle_action(KeyAction::OpenDetail);
    let Command::FetchDetail(req) = outcome.commands[0].clone() else {
        panic!("expected detail fetch");
    };
    state.apply(AppEvent::DetailFetched {
        token: req.token,
        log_id: req.log_id.clone(),
        result: Err(FetchError::NotFound {
            log_id: req.log_id.to_string(),
        }),
    });

    assert!(state.detail.is_visible());
    assert!(matches!(
        state.detail.state(),
        DetailState::Failed {
            error: DetailError::Fetch(FetchError::NotFound { .. }),
            ..
        }
    ));
}

#[test]
fn close_hides_detail_and_restores_table_keys() {
    let mut state = open_state();
    state.handle_action(KeyAction::OpenDetail);
    state.handle_action(KeyAction::Close);
    assert!(!state.detail.is_visible());

    let outcome = state.handle_action(KeyAction::NextPage);
    assert_eq!(outcome.commands.len(), 1);
}

#[test]
fn page_keys_scroll_while_detail_open() {
    let mut state = open_state();
    state.handle_action(KeyAction::OpenDetail);
    let outcome = state.handle_action(KeyAction::NextPage);
    assert!(outcome.commands.is_empty());
    assert_eq!(state.detail.scroll(), 10);
}

#[test]
fn quit_sets_flag() {
    let mut state = open_state();
    assert!(state.handle_action(KeyAction::Quit).quit);
}

#[test]
fn quit_works_behind_gate() {
    let mut state = AppState::new(10, PrependPolicy::Always, &MemorySession::default());
    state.start();
    assert!(state.handle_action(KeyAction::Quit).quit);
}

#[test]
fn channel_status_is_recorded() {
    let mut state = open_state();
    state.apply(AppEvent::Channel(ChannelStatus::Disconnected {
        reason: Some("refused".into()),
    }));
    assert!(matches!(state.channel, ChannelStatus::Disconnected { .. }));
    state.apply(AppEvent::Channel(ChannelStatus::Connected));
    assert_eq!(state.channel, ChannelStatus::Connected);
}

#[test]
fn selection_clamped_after_shorter_page() {
    let mut state = open_state();
    state.handle_action(KeyAction::SelectLast);
    assert_eq!(state.selected(), 9);

    let req = state.pagination.reload();
    state.apply(AppEvent::PageFetched {
        token: req.token,
        result: Ok(page(1, 3, 3)),
    });
    assert_eq!(state.selected(), 2);
}
