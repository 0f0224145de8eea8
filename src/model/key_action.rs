//! Domain-level keyboard actions independent of key bindings.

/// User intent, not specific keys. The mapping from
/// `crossterm::event::KeyEvent` to `KeyAction` is handled by `KeyBindings`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAction {
    // Table selection
    /// Move selection one row up. Default: k/↑
    SelectPrev,
    /// Move selection one row down. Default: j/↓
    SelectNext,
    /// Jump to the first row. Default: g/Home
    SelectFirst,
    /// Jump to the last row. Default: G/End
    SelectLast,

    // Pagination
    /// Request the next page. Default: n/→/Page Down
    NextPage,
    /// Request the previous page. Default: p/←/Page Up
    PrevPage,
    /// Re-request the current page. Default: r
    Reload,

    // Detail view
    /// Open the detail view for the selected row. Default: Enter
    OpenDetail,
    /// Close the detail view or help. Default: Esc
    Close,
    /// Scroll the detail view down. Default: Ctrl+d
    DetailScrollDown,
    /// Scroll the detail view up. Default: Ctrl+u
    DetailScrollUp,

    // Application
    /// Toggle the key help line. Default: ?
    Help,
    /// Quit. Default: q/Ctrl+c
    Quit,
}
