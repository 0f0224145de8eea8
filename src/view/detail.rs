//! Detail modal for a single logged request.

use crate::model::{LogEntryDetail, PayloadFragment};
use crate::state::{DetailError, DetailState};
use crate::view::format;
use crate::view::styles::DashboardStyles;
use chrono::{DateTime, Utc};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

/// Modal size as a share of the screen.
const DETAIL_WIDTH_PERCENT: u16 = 85;
const DETAIL_HEIGHT_PERCENT: u16 = 85;

pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_width = area.width * percent_x / 100;
    let popup_height = area.height * percent_y / 100;
    Rect {
        x: area.x + area.width.saturating_sub(popup_width) / 2,
        y: area.y + area.height.saturating_sub(popup_height) / 2,
        width: popup_width,
        height: popup_height,
    }
}

fn field(label: &str, value: impl Into<String>, styles: &DashboardStyles) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {label:<10} "), styles.key_hint),
        Span::raw(value.into()),
    ])
}

fn section(title: &str, styles: &DashboardStyles) -> Line<'static> {
    Line::from(Span::styled(title.to_string(), styles.section))
}

fn body_lines(fragments: &[PayloadFragment], styles: &DashboardStyles) -> Vec<Line<'static>> {
    if fragments.is_empty() {
        return vec![Line::from(Span::styled("  (empty)", styles.muted))];
    }
    fragments
        .iter()
        .flat_map(|fragment| {
            fragment
                .to_pretty()
                .lines()
                .map(|line| Line::from(format!("  {line}")))
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Lines of the ready state.
pub fn detail_lines(
    detail: &LogEntryDetail,
    styles: &DashboardStyles,
    now: DateTime<Utc>,
) -> Vec<Line<'static>> {
    let summary = detail.summary();
    let request = &detail.request;

    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                format!("{} ", summary.method().to_ascii_uppercase()),
                styles.method(summary.method()),
            ),
            Span::raw(format!("{} ", summary.path())),
            Span::styled(
                format!(" {} ", detail.response.status),
                styles.status_badge(detail.response.status),
            ),
        ]),
        Line::default(),
        section("General", styles),
        field("Hostname", request.hostname.clone(), styles),
        field("IP", request.ip_address.clone(), styles),
        field("URL", request.url.clone(), styles),
        field("Duration", format::duration(summary.duration_ms()), styles),
        field(
            "Time",
            format!(
                "{} ({})",
                format::absolute_time(summary.timestamp()),
                format::relative_time(summary.timestamp(), now)
            ),
            styles,
        ),
        Line::default(),
        section("Request headers", styles),
    ];

    if request.headers.is_empty() {
        lines.push(Line::from(Span::styled("  (none)", styles.muted)));
    }
    for header in &request.headers {
        lines.push(Line::from(vec![
            Span::styled(format!("  {}: ", header.key), styles.muted),
            Span::raw(header.value.clone()),
        ]));
    }

    lines.push(Line::default());
    lines.push(section("Request body", styles));
    lines.extend(body_lines(&request.body, styles));

    lines.push(Line::default());
    lines.push(section("Response body", styles));
    lines.extend(body_lines(&detail.response.body, styles));
    lines
}

fn error_lines(error: &DetailError, styles: &DashboardStyles) -> Vec<Line<'static>> {
    let title = match error {
        DetailError::Fetch(fetch) => format!("Could not load this request ({})", fetch.kind_label()),
        DetailError::MissingId => "Details unavailable".to_string(),
    };
    vec![
        Line::from(Span::styled(title, styles.error_text)),
        Line::default(),
        Line::from(error.to_string()),
    ]
}

/// Render the modal over whatever is on screen.
pub fn render_detail_modal(
    frame: &mut Frame,
    state: &DetailState,
    scroll: u16,
    styles: &DashboardStyles,
    now: DateTime<Utc>,
) {
    let area = centered_rect(DETAIL_WIDTH_PERCENT, DETAIL_HEIGHT_PERCENT, frame.area());
    frame.render_widget(Clear, area);

    let (title, lines) = match state {
        DetailState::Empty => (" Request ".to_string(), Vec::new()),
        DetailState::Loading { log_id } => (
            format!(" Request {log_id} "),
            vec![Line::from(Span::styled("Loading…", styles.muted))],
        ),
        DetailState::Ready(detail) => (
            match detail.log_id() {
                Some(id) => format!(" Request {id} "),
                None => " Request ".to_string(),
            },
            detail_lines(detail, styles, now),
        ),
        DetailState::Failed { log_id, error } => (
            match log_id {
                Some(id) => format!(" Request {id} "),
                None => " Request ".to_string(),
            },
            error_lines(error, styles),
        ),
    };

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(Span::styled(title, styles.header))
                .title_bottom(Line::from(Span::styled(
                    " Esc close · Ctrl+d/Ctrl+u scroll ",
                    styles.muted,
                ))),
        )
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));

    frame.render_widget(paragraph, area);
}
