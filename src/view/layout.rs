//! Screen layout: header, body and footer, plus overlays.
//!
//! The body depends on the access gate: a placeholder while the server
//! config is checked, a login notice when a session is required, and the
//! request table otherwise.

use crate::state::{AccessGate, AppState};
use crate::view::constants::{FOOTER_HEIGHT, HEADER_HEIGHT};
use crate::view::live_indicator::LiveIndicator;
use crate::view::styles::DashboardStyles;
use crate::view::{detail, help, table};
use chrono::{DateTime, Utc};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

/// Per-frame inputs that are not part of the application state.
#[derive(Debug, Clone, Copy)]
pub struct FrameContext<'a> {
    /// Styles for this frame.
    pub styles: &'a DashboardStyles,
    /// Clock used for relative timestamps.
    pub now: DateTime<Utc>,
    /// Blink phase of the live indicator.
    pub blink_on: bool,
    /// Shown in the header so the user knows which server is displayed.
    pub server: &'a str,
}

/// Draw the whole dashboard for one frame.
pub fn render_layout(frame: &mut Frame, state: &AppState, ctx: &FrameContext<'_>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Min(0),
            Constraint::Length(FOOTER_HEIGHT),
        ])
        .split(frame.area());

    render_header(frame, chunks[0], state, ctx);

    match state.gate {
        AccessGate::Checking => render_notice(
            frame,
            chunks[1],
            ctx.styles,
            "Connecting",
            &["Checking server configuration…"],
        ),
        AccessGate::LoginRequired => render_notice(
            frame,
            chunks[1],
            ctx.styles,
            "Login required",
            &[
                "This server requires authentication.",
                "",
                "Log in through the web dashboard, then run `argus --login`",
                "to remember the session here.",
            ],
        ),
        AccessGate::Open => table::render_log_table(frame, chunks[1], state, ctx.styles, ctx.now),
    }

    render_footer(frame, chunks[2], state, ctx.styles);

    if state.detail.is_visible() {
        detail::render_detail_modal(
            frame,
            state.detail.state(),
            state.detail.scroll(),
            ctx.styles,
            ctx.now,
        );
    }
    if state.help_visible {
        help::render_help_overlay(frame, ctx.styles);
    }
}

fn render_header(frame: &mut Frame, area: Rect, state: &AppState, ctx: &FrameContext<'_>) {
    let indicator = LiveIndicator::new(&state.channel, ctx.blink_on).render(ctx.styles);
    let indicator_width = indicator.width() as u16;

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(indicator_width + 1)])
        .split(area);

    let title = Line::from(vec![
        Span::styled(" argus ", ctx.styles.header),
        Span::styled(ctx.server.to_string(), ctx.styles.muted),
    ]);
    frame.render_widget(Paragraph::new(title), chunks[0]);
    frame.render_widget(
        Paragraph::new(indicator).alignment(Alignment::Right),
        chunks[1],
    );
}

fn render_footer(frame: &mut Frame, area: Rect, state: &AppState, styles: &DashboardStyles) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(area);

    if state.gate == AccessGate::Open {
        frame.render_widget(Paragraph::new(table::pagination_line(state, styles)), chunks[0]);
    }
    frame.render_widget(Paragraph::new(help::hint_line(styles)), chunks[1]);
}

fn render_notice(
    frame: &mut Frame,
    area: Rect,
    styles: &DashboardStyles,
    title: &str,
    lines: &[&str],
) {
    let text: Vec<Line> = lines.iter().map(|l| Line::from(l.to_string())).collect();
    let paragraph = Paragraph::new(text)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(Span::styled(format!(" {title} "), styles.header)),
        );
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
#[path = "layout_tests.rs"]
mod tests;
