//! LIVE indicator widget for the header.
//!
//! Shows the realtime channel health:
//! - Blinking green while connected
//! - Yellow while connecting
//! - Red with the reason once the channel drops; the table keeps working
//!   from REST until it reconnects

use crate::state::ChannelStatus;
use crate::view::styles::DashboardStyles;
use ratatui::{
    style::Color,
    text::{Line, Span},
};

const LIVE_LABEL: &str = "● LIVE";
const CONNECTING_LABEL: &str = "○ CONNECTING";
const OFFLINE_LABEL: &str = "○ OFFLINE";

/// Stateless; the blink phase is driven by the UI timer.
#[derive(Debug, Clone)]
pub struct LiveIndicator<'a> {
    status: &'a ChannelStatus,
    blink_on: bool,
}

impl<'a> LiveIndicator<'a> {
    /// Indicator for `status` at blink phase `blink_on`.
    pub fn new(status: &'a ChannelStatus, blink_on: bool) -> Self {
        Self { status, blink_on }
    }

    /// Header span for the current status.
    pub fn render(&self, styles: &DashboardStyles) -> Line<'static> {
        match self.status {
            ChannelStatus::Connected => {
                if self.blink_on {
                    Line::from(Span::styled(LIVE_LABEL, styles.indicator(Color::Green)))
                } else {
                    // Keep the width stable while the dot is off.
                    Line::from(Span::styled("  LIVE", styles.indicator(Color::Green)))
                }
            }
            ChannelStatus::Connecting => Line::from(Span::styled(
                CONNECTING_LABEL,
                styles.indicator(Color::Yellow),
            )),
            ChannelStatus::Disconnected { reason } => {
                let mut spans = vec![Span::styled(OFFLINE_LABEL, styles.indicator(Color::Red))];
                if let Some(reason) = reason {
                    spans.push(Span::styled(format!(" ({reason})"), styles.muted));
                }
                Line::from(spans)
            }
        }
    }
}

// ===== Tests =====

#[cfg(test)]
#[path = "live_indicator_tests.rs"]
mod tests;
