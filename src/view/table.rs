//! Request table and its pagination footer.

use crate::model::LogEntrySummary;
use crate::state::{AppState, LoadPhase};
use crate::view::format;
use crate::view::styles::DashboardStyles;
use chrono::{DateTime, Utc};
use ratatui::{
    layout::{Alignment, Constraint, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

const VERB_WIDTH: u16 = 7;
const STATUS_WIDTH: u16 = 6;
const DURATION_WIDTH: u16 = 10;
const HAPPENED_WIDTH: u16 = 18;
const COLUMN_SPACING: u16 = 1;

/// Width left for the path column inside `area`.
fn path_width(area: Rect) -> u16 {
    let fixed = VERB_WIDTH + STATUS_WIDTH + DURATION_WIDTH + HAPPENED_WIDTH + 4 * COLUMN_SPACING;
    // Two columns of border.
    area.width.saturating_sub(fixed + 2).max(4)
}

fn entry_row<'a>(
    entry: &LogEntrySummary,
    path_width: u16,
    styles: &DashboardStyles,
    now: DateTime<Utc>,
) -> Row<'a> {
    Row::new(vec![
        Cell::from(Span::styled(
            entry.method().to_ascii_uppercase(),
            styles.method(entry.method()),
        )),
        Cell::from(format::truncate(entry.path(), path_width as usize)),
        Cell::from(Span::styled(
            format!(" {} ", entry.status()),
            styles.status_badge(entry.status()),
        )),
        Cell::from(format::duration(entry.duration_ms())),
        Cell::from(Span::styled(
            format::relative_time(entry.timestamp(), now),
            styles.muted,
        )),
    ])
}

/// Render the table of summaries with the selection highlighted.
pub fn render_log_table(
    frame: &mut Frame,
    area: Rect,
    state: &AppState,
    styles: &DashboardStyles,
    now: DateTime<Utc>,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(" Requests ", styles.header));

    if state.feed.is_empty() {
        let message = match state.pagination.phase() {
            LoadPhase::Idle | LoadPhase::Loading { .. } => "Loading requests…",
            LoadPhase::Error { .. } => "Could not load requests",
            LoadPhase::Loaded => "No requests logged yet",
        };
        let placeholder = Paragraph::new(Line::from(Span::styled(message, styles.muted)))
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(placeholder, area);
        return;
    }

    let path_width = path_width(area);
    let rows: Vec<Row> = state
        .feed
        .entries()
        .map(|entry| entry_row(entry, path_width, styles, now))
        .collect();

    let header = Row::new(vec!["VERB", "PATH", "STATUS", "DURATION", "HAPPENED"]).style(styles.header);

    let table = Table::new(
        rows,
        [
            Constraint::Length(VERB_WIDTH),
            Constraint::Min(path_width),
            Constraint::Length(STATUS_WIDTH),
            Constraint::Length(DURATION_WIDTH),
            Constraint::Length(HAPPENED_WIDTH),
        ],
    )
    .header(header)
    .column_spacing(COLUMN_SPACING)
    .block(block)
    .row_highlight_style(styles.selected_row);

    let mut table_state = TableState::default().with_selected(Some(state.selected()));
    frame.render_stateful_widget(table, area, &mut table_state);
}

/// Footer text: page position, load phase and live hints.
pub fn pagination_line(state: &AppState, styles: &DashboardStyles) -> Line<'static> {
    let pagination = state.feed.pagination();
    let mut spans = vec![Span::raw(format!(
        " Page {} of {} · {} requests",
        pagination.current_page(),
        pagination.total_pages(),
        pagination.total_count()
    ))];

    if let Some(live_total) = state.feed.live_total_hint() {
        if live_total != pagination.total_count() {
            spans.push(Span::styled(format!(" ({live_total} live)"), styles.muted));
        }
    }

    match state.pagination.phase() {
        LoadPhase::Loading { page } => {
            spans.push(Span::styled(format!("  loading page {page}…"), styles.muted));
        }
        LoadPhase::Error { page, error } => {
            spans.push(Span::styled(
                format!("  page {page} failed: {error} (r to retry)"),
                styles.error_text,
            ));
        }
        LoadPhase::Idle | LoadPhase::Loaded => {}
    }

    if state.feed.ordering_violations() > 0 {
        spans.push(Span::styled(
            format!("  {} out of order", state.feed.ordering_violations()),
            styles.muted,
        ));
    }

    if let Some(reason) = &state.last_malformed {
        spans.push(Span::styled(
            format!("  skipped push: {}", format::truncate(reason, 40)),
            styles.error_text,
        ));
    }

    Line::from(spans)
}

#[cfg(test)]
#[path = "table_tests.rs"]
mod tests;
