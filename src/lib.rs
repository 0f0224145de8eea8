//! Argus request logger dashboard
//!
//! TUI client for an Argus HTTP request/response logger: a paginated table
//! of recorded requests, kept live by the server's realtime channel, with a
//! detail view per request.
//!
//! Pure Core / Impure Shell: `model` and `state` hold data and transitions
//! with no I/O; `transport` and `view` execute the commands they produce.

pub mod config;
pub mod logging;
pub mod model;
pub mod session;
pub mod state;
pub mod transport;
pub mod view;

#[cfg(test)]
mod test_harness;

#[cfg(test)]
mod tests;
