//! Internal test modules - whitebox tests with crate access
//!
//! Harness-based acceptance tests drive the full TUI app against a
//! scripted log server, with no network and no real terminal.

mod acceptance_pagination;
