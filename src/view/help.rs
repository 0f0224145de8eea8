//! Help overlay listing the keyboard shortcuts.
//!
//! Toggled by '?', dismissed by 'Esc' or '?'.

use super::constants::{HELP_POPUP_HEIGHT_PERCENT, HELP_POPUP_WIDTH_PERCENT};
use super::detail::centered_rect;
use super::styles::DashboardStyles;
use ratatui::{
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

/// (keys, description) grouped under a heading.
const SHORTCUTS: &[(&str, &[(&str, &str)])] = &[
    (
        "Table",
        &[
            ("j/↓  k/↑", "Select next / previous request"),
            ("g/Home  G/End", "Select first / last request"),
            ("Enter", "Open request details"),
        ],
    ),
    (
        "Pages",
        &[
            ("n/→/PgDn", "Next page"),
            ("p/←/PgUp", "Previous page"),
            ("r", "Reload current page"),
        ],
    ),
    (
        "Details",
        &[
            ("Ctrl+d  Ctrl+u", "Scroll down / up"),
            ("Esc", "Close"),
        ],
    ),
    (
        "Application",
        &[("?", "Toggle this help"), ("q/Ctrl+c", "Quit")],
    ),
];

/// Lines of the overlay, grouped by category.
pub fn help_lines(styles: &DashboardStyles) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for (index, (category, entries)) in SHORTCUTS.iter().enumerate() {
        if index > 0 {
            lines.push(Line::default());
        }
        lines.push(Line::from(Span::styled(*category, styles.section)));
        for (keys, description) in entries.iter() {
            lines.push(Line::from(vec![
                Span::styled(format!("  {keys:<16}"), styles.key_hint),
                Span::raw(*description),
            ]));
        }
    }
    lines
}

/// One-line hint shown in the footer when the overlay is closed.
pub fn hint_line(styles: &DashboardStyles) -> Line<'static> {
    Line::from(vec![
        Span::styled(" ↑↓", styles.key_hint),
        Span::styled(" select  ", styles.muted),
        Span::styled("Enter", styles.key_hint),
        Span::styled(" details  ", styles.muted),
        Span::styled("n/p", styles.key_hint),
        Span::styled(" page  ", styles.muted),
        Span::styled("r", styles.key_hint),
        Span::styled(" reload  ", styles.muted),
        Span::styled("?", styles.key_hint),
        Span::styled(" help  ", styles.muted),
        Span::styled("q", styles.key_hint),
        Span::styled(" quit", styles.muted),
    ])
}

/// Render the help overlay centered on the screen.
pub fn render_help_overlay(frame: &mut Frame, styles: &DashboardStyles) {
    let popup_area = centered_rect(
        HELP_POPUP_WIDTH_PERCENT,
        HELP_POPUP_HEIGHT_PERCENT,
        frame.area(),
    );
    frame.render_widget(Clear, popup_area);

    let help_paragraph = Paragraph::new(help_lines(styles))
        .block(
            Block::default()
                .title(Span::styled(" Keyboard Shortcuts ", styles.header))
                .borders(Borders::ALL),
        )
        .wrap(Wrap { trim: false })
        .alignment(Alignment::Left);
    frame.render_widget(help_paragraph, popup_area);

    let hint_area = Rect {
        x: popup_area.x,
        y: popup_area.y + popup_area.height.saturating_sub(1),
        width: popup_area.width,
        height: 1,
    };
    let hint = Paragraph::new(Line::from(Span::styled(
        " Press Esc or ? to close ",
        styles.muted,
    )))
    .alignment(Alignment::Center);
    frame.render_widget(hint, hint_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::styles::ColorConfig;

    fn text(lines: &[Line<'_>]) -> String {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn help_lists_every_category() {
        let content = text(&help_lines(&DashboardStyles::new(ColorConfig::disabled())));
        for category in ["Table", "Pages", "Details", "Application"] {
            assert!(content.contains(category), "missing {category}");
        }
        assert!(content.contains("Reload current page"));
    }

    #[test]
    fn hint_mentions_quit_and_help() {
        let content = text(&[hint_line(&DashboardStyles::new(ColorConfig::disabled()))]);
        assert!(content.contains("help"));
        assert!(content.contains("quit"));
    }
}
