//! Dashboard styling.
//!
//! Status badges are green for the positive codes and red for everything
//! else; methods get a fixed color each so the verb column scans quickly.

use crate::model::StatusClass;
use ratatui::style::{Color, Modifier, Style};

// ===== ColorConfig =====

/// Configuration for color output.
///
/// Determines whether colors should be enabled or disabled based on:
/// - `--no-color` CLI flag
/// - `NO_COLOR` environment variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorConfig {
    enabled: bool,
}

impl ColorConfig {
    /// Create a ColorConfig from CLI args and environment.
    ///
    /// Priority (first match wins):
    /// 1. `--no-color` flag (disables colors)
    /// 2. `NO_COLOR` env var (any value disables colors)
    /// 3. Default: colors enabled
    pub fn from_env_and_args(no_color_flag: bool) -> Self {
        let enabled = !no_color_flag && std::env::var("NO_COLOR").is_err();
        Self { enabled }
    }

    /// Colors on.
    pub fn enabled() -> Self {
        Self { enabled: true }
    }

    /// Colors off.
    pub fn disabled() -> Self {
        Self { enabled: false }
    }

    /// Check if colors are enabled.
    pub fn colors_enabled(self) -> bool {
        self.enabled
    }
}

// ===== DashboardStyles =====

/// Every style the dashboard draws with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardStyles {
    colors: bool,
    /// Title bar.
    pub header: Style,
    /// Secondary text.
    pub muted: Style,
    /// Highlighted table row.
    pub selected_row: Style,
    /// Error messages.
    pub error_text: Style,
    /// Key names in hints.
    pub key_hint: Style,
    /// Section titles in the detail view.
    pub section: Style,
}

impl DashboardStyles {
    /// Styles for `config`; all plain when colors are off.
    pub fn new(config: ColorConfig) -> Self {
        if config.colors_enabled() {
            Self {
                colors: true,
                header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                muted: Style::default().fg(Color::DarkGray),
                selected_row: Style::default()
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD),
                error_text: Style::default().fg(Color::Red),
                key_hint: Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
                section: Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::BOLD),
            }
        } else {
            Self {
                colors: false,
                header: Style::default().add_modifier(Modifier::BOLD),
                muted: Style::default(),
                selected_row: Style::default().add_modifier(Modifier::REVERSED),
                error_text: Style::default(),
                key_hint: Style::default().add_modifier(Modifier::BOLD),
                section: Style::default().add_modifier(Modifier::BOLD),
            }
        }
    }

    /// Whether colored styles are in use.
    pub fn colors_enabled(&self) -> bool {
        self.colors
    }

    /// Badge style for a status code.
    pub fn status_badge(&self, status: u16) -> Style {
        if !self.colors {
            return Style::default().add_modifier(Modifier::BOLD);
        }
        match StatusClass::of(status) {
            StatusClass::Positive => Style::default()
                .fg(Color::Black)
                .bg(Color::Green)
                .add_modifier(Modifier::BOLD),
            StatusClass::Error => Style::default()
                .fg(Color::White)
                .bg(Color::Red)
                .add_modifier(Modifier::BOLD),
        }
    }

    /// Badge style for an HTTP method.
    pub fn method(&self, method: &str) -> Style {
        if !self.colors {
            return Style::default();
        }
        let color = match method.to_ascii_uppercase().as_str() {
            "GET" => Color::Blue,
            "POST" => Color::Green,
            "PUT" | "PATCH" => Color::Yellow,
            "DELETE" => Color::Red,
            _ => Color::Gray,
        };
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    }

    /// Foreground for the live indicator.
    pub fn indicator(&self, color: Color) -> Style {
        if self.colors {
            Style::default().fg(color)
        } else {
            Style::default()
        }
    }
}

impl Default for DashboardStyles {
    fn default() -> Self {
        Self::new(ColorConfig::from_env_and_args(false))
    }
}

// ===== Tests =====
