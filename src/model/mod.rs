//! Domain model types (pure).
//!
//! All types in this module are pure data with smart constructors.

pub mod error;
pub mod identifiers;
pub mod key_action;
pub mod log_entry;
pub mod pagination;
pub mod wire;

// Re-export for convenience
pub use error::{AppError, ChannelError, FetchError};
pub use identifiers::{InvalidLogId, LogId};
pub use key_action::KeyAction;
pub use log_entry::{
    Header, InvalidEntry, LogEntryDetail, LogEntrySummary, PayloadFragment, RequestDetail,
    ResponseDetail, StatusClass,
};
pub use pagination::PaginationState;
pub use wire::{FetchedPage, RealtimeLogEvent, ServerConfig};
