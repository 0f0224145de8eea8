//! UI state machines (pure).
//!
//! All state transitions are pure functions testable without TUI or network.

pub mod app_state;
pub mod detail;
pub mod feed_store;
pub mod pagination;
pub mod token;

// Re-export for convenience
pub use app_state::{AccessGate, ActionOutcome, AppEvent, AppState, ChannelStatus, Command};
pub use detail::{DetailError, DetailLoader, DetailRequest, DetailState};
pub use feed_store::{LogFeedStore, PrependOutcome, PrependPolicy};
pub use pagination::{LoadPhase, PageRequest, PageResolution, PaginationController};
pub use token::RequestToken;
