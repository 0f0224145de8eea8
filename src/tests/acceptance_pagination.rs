//! Acceptance tests: paging through the request log
//!
//! Page changes replace the list with the server's page, failures keep the
//! previous rows on screen, and a slow earlier response never wins over a
//! later one.

use crate::model::FetchError;
use crate::state::LoadPhase;
use crate::test_harness::{AcceptanceTestHarness, ScriptedApi};
use crossterm::event::KeyCode;
use std::time::Duration;

#[test]
fn mount_loads_first_page() {
    let mut harness = AcceptanceTestHarness::new(ScriptedApi::new(47), false);
    harness.start();

    let pagination = harness.state().feed.pagination();
    assert_eq!(pagination.current_page(), 1);
    assert_eq!(pagination.page_size(), 10);
    assert_eq!(pagination.total_count(), 47);
    assert_eq!(harness.state().feed.len(), 10);
    assert_eq!(harness.api().calls(), vec!["config", "page 1"]);
    assert!(harness.screen().contains("Page 1 of 5 · 47 requests"));
}

#[test]
fn next_and_previous_page() {
    let mut harness = AcceptanceTestHarness::new(ScriptedApi::new(47), false);
    harness.start();

    harness.press(KeyCode::Char('n'));
    harness.settle(1);
    assert_eq!(harness.state().feed.pagination().current_page(), 2);
    assert_eq!(harness.row_ids()[0], "p2e0");

    harness.press(KeyCode::Left);
    harness.settle(1);
    assert_eq!(harness.state().feed.pagination().current_page(), 1);
    assert_eq!(harness.row_ids()[0], "p1e0");
}

#[test]
fn last_page_is_partial_and_next_is_a_noop() {
    let mut harness = AcceptanceTestHarness::new(ScriptedApi::new(47), false);
    harness.start();

    for _ in 0..4 {
        harness.press(KeyCode::Char('n'));
        harness.settle(1);
    }
    assert_eq!(harness.state().feed.pagination().current_page(), 5);
    assert_eq!(harness.state().feed.len(), 7);

    let calls_before = harness.api().calls().len();
    harness.press(KeyCode::Char('n'));
    assert_eq!(harness.api().calls().len(), calls_before);
}

#[test]
fn previous_on_first_page_is_a_noop() {
    let mut harness = AcceptanceTestHarness::new(ScriptedApi::new(47), false);
    harness.start();
    harness.press(KeyCode::Char('p'));
    assert_eq!(harness.api().calls(), vec!["config", "page 1"]);
}

#[test]
fn slow_earlier_page_never_overwrites_later_page() {
    // Page 2 answers after page 3.
    let api = ScriptedApi::new(47).with_page_delay(2, Duration::from_millis(300));
    let mut harness = AcceptanceTestHarness::new(api, false);
    harness.start();

    harness.press(KeyCode::Char('n'));
    harness.press(KeyCode::Char('n'));
    assert_eq!(harness.settle(2), 2);

    assert_eq!(harness.state().feed.pagination().current_page(), 3);
    assert_eq!(harness.row_ids()[0], "p3e0");
    assert_eq!(harness.state().pagination.phase(), &LoadPhase::Loaded);
}

#[test]
fn failed_page_keeps_previous_rows_and_reload_recovers() {
    let mut harness = AcceptanceTestHarness::new(ScriptedApi::new(47), false);
    harness.start();

    harness
        .api()
        .fail_page_once(2, FetchError::status(503, "503 Service Unavailable"));
    harness.press(KeyCode::Char('n'));
    harness.settle(1);

    assert!(matches!(
        harness.state().pagination.phase(),
        LoadPhase::Error { page: 2, .. }
    ));
    assert_eq!(harness.row_ids()[0], "p1e0");
    let screen = harness.screen();
    assert!(screen.contains("page 2 failed"), "{screen}");
    assert!(screen.contains("(r to retry)"));

    // Error → Loading on the next page change.
    harness.press(KeyCode::Char('n'));
    harness.settle(1);
    assert_eq!(harness.state().feed.pagination().current_page(), 2);
    assert_eq!(harness.state().pagination.phase(), &LoadPhase::Loaded);
}

#[test]
fn retry_hint_refetches_the_failed_page() {
    let mut harness = AcceptanceTestHarness::new(ScriptedApi::new(47), false);
    harness.start();

    harness
        .api()
        .fail_page_once(2, FetchError::network("connection reset"));
    harness.press(KeyCode::Char('n'));
    harness.settle(1);
    assert!(harness.screen().contains("(r to retry)"));

    harness.press(KeyCode::Char('r'));
    harness.settle(1);

    assert_eq!(
        harness.api().calls(),
        vec!["config", "page 1", "page 2", "page 2"]
    );
    assert_eq!(harness.state().feed.pagination().current_page(), 2);
    assert_eq!(harness.row_ids()[0], "p2e0");
}

#[test]
fn reload_refetches_current_page() {
    let mut harness = AcceptanceTestHarness::new(ScriptedApi::new(47), false);
    harness.start();
    harness.press(KeyCode::Char('r'));
    harness.settle(1);
    assert_eq!(harness.api().calls(), vec!["config", "page 1", "page 1"]);
}

#[test]
fn empty_server_shows_placeholder() {
    let mut harness = AcceptanceTestHarness::new(ScriptedApi::new(0), false);
    harness.start();
    let screen = harness.screen();
    assert!(screen.contains("No requests logged yet"), "{screen}");
    assert!(screen.contains("Page 1 of 1 · 0 requests"));
}
