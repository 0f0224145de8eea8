//! TUI rendering and terminal management (impure shell)

pub mod constants;
pub mod detail;
pub mod format;
pub mod help;
mod layout;
pub mod live_indicator;
pub mod styles;
pub mod table;

pub use layout::{render_layout, FrameContext};
pub use live_indicator::LiveIndicator;
pub use styles::{ColorConfig, DashboardStyles};

use crate::config::keybindings::KeyBindings;
use crate::config::ResolvedConfig;
use crate::model::{AppError, KeyAction};
use crate::session::{FileSession, MemorySession, Session};
use crate::state::{AppEvent, AppState};
use crate::transport::{subscribe_feed, Dispatcher, RestClient, Subscription, TransportClient};
use chrono::Utc;
use crossterm::{
    event::{self, Event, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

/// How long the loop waits for terminal input before draining transport events.
const POLL_INTERVAL: Duration = Duration::from_millis(100);
/// Blink period of the live indicator; also refreshes relative timestamps.
const BLINK_INTERVAL: Duration = Duration::from_millis(500);

/// Errors that can occur during TUI operations
#[derive(Debug, Error)]
pub enum TuiError {
    /// IO error during terminal operations
    #[error("Terminal IO error: {0}")]
    Io(#[from] io::Error),

    /// Application error
    #[error("Application error: {0}")]
    App(#[from] AppError),
}

/// Main TUI application
///
/// Generic over backend to support testing with TestBackend
pub struct TuiApp<B>
where
    B: ratatui::backend::Backend,
{
    terminal: Terminal<B>,
    app_state: AppState,
    dispatcher: Dispatcher,
    events: Receiver<AppEvent>,
    key_bindings: KeyBindings,
    styles: DashboardStyles,
    server_label: String,
    blink_on: bool,
    /// Realtime handlers; released when the app is dropped.
    _subscriptions: Vec<Subscription>,
}

impl TuiApp<CrosstermBackend<Stdout>> {
    /// Create and initialize a new TUI application
    ///
    /// Sets up terminal in raw mode with alternate screen
    pub fn new(
        transport: &TransportClient,
        app_state: AppState,
        styles: DashboardStyles,
        server_label: String,
    ) -> Result<Self, TuiError> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        stdout.execute(EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(Self::with_terminal(
            terminal,
            transport,
            app_state,
            styles,
            server_label,
        ))
    }

    /// Run the main event loop
    ///
    /// Returns when user quits (q or Ctrl+C)
    pub fn run(&mut self) -> Result<(), TuiError> {
        self.start();
        self.draw()?;
        let mut last_blink = Instant::now();

        loop {
            let mut dirty = false;

            if event::poll(POLL_INTERVAL)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        if self.handle_key(key) {
                            return Ok(());
                        }
                        dirty = true;
                    }
                    Event::Resize(_, _) => dirty = true,
                    _ => {}
                }
            }

            if self.drain_events() > 0 {
                dirty = true;
            }

            if last_blink.elapsed() >= BLINK_INTERVAL {
                self.blink_on = !self.blink_on;
                last_blink = Instant::now();
                dirty = true;
            }

            if dirty {
                self.draw()?;
            }
        }
    }
}

impl<B> TuiApp<B>
where
    B: ratatui::backend::Backend,
{
    /// Wire the app to a transport without touching the real terminal.
    pub fn with_terminal(
        terminal: Terminal<B>,
        transport: &TransportClient,
        app_state: AppState,
        styles: DashboardStyles,
        server_label: String,
    ) -> Self {
        let (tx, rx) = mpsc::channel();
        let subscriptions = subscribe_feed(transport, tx.clone());
        let dispatcher = Dispatcher::new(transport.api(), tx);

        Self {
            terminal,
            app_state,
            dispatcher,
            events: rx,
            key_bindings: KeyBindings::default(),
            styles,
            server_label,
            blink_on: true,
            _subscriptions: subscriptions,
        }
    }

    /// Issue the startup commands.
    pub fn start(&mut self) {
        let commands = self.app_state.start();
        self.dispatcher.execute_all(commands);
    }

    /// Application state, for inspection.
    pub fn app_state(&self) -> &AppState {
        &self.app_state
    }

    /// Underlying terminal, for inspection.
    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }

    /// Apply one event and execute the commands it produced.
    fn apply_event(&mut self, event: AppEvent) {
        let commands = self.app_state.apply(event);
        self.dispatcher.execute_all(commands);
    }

    /// Apply every queued completion and push. Returns how many were applied.
    pub fn drain_events(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events.try_recv() {
            self.apply_event(event);
            applied += 1;
        }
        if applied > 0 {
            debug!(applied, "Applied transport events");
        }
        applied
    }

    /// Block up to `timeout` for one event, then drain the rest.
    pub fn wait_for_events(&mut self, timeout: Duration) -> usize {
        match self.events.recv_timeout(timeout) {
            Ok(event) => {
                self.apply_event(event);
                1 + self.drain_events()
            }
            Err(_) => 0,
        }
    }

    /// Handle a single keyboard event
    ///
    /// Returns true if app should quit
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let Some(action) = self.key_bindings.get(key) else {
            return false;
        };

        // Esc closes help before anything underneath.
        if action == KeyAction::Close && self.app_state.help_visible {
            self.app_state.help_visible = false;
            return false;
        }

        let outcome = self.app_state.handle_action(action);
        self.dispatcher.execute_all(outcome.commands);
        outcome.quit
    }

    /// Render one frame.
    pub fn draw(&mut self) -> Result<(), TuiError> {
        let ctx = FrameContext {
            styles: &self.styles,
            now: Utc::now(),
            blink_on: self.blink_on,
            server: &self.server_label,
        };
        let state = &self.app_state;
        self.terminal.draw(|frame| render_layout(frame, state, &ctx))?;
        Ok(())
    }
}

/// Open the persisted session, falling back to a logged-out in-memory one
/// when the file is unreadable.
fn load_session(config: &ResolvedConfig) -> Box<dyn Session> {
    match FileSession::load(&config.session_file_path) {
        Ok(session) => Box::new(session),
        Err(e) => {
            warn!(error = %e, "Ignoring unreadable session file");
            Box::new(MemorySession::default())
        }
    }
}

/// Run the dashboard against the configured server.
///
/// Handles terminal setup, runs the event loop, and restores the terminal
/// on exit. Logging must be initialized by the caller.
pub fn run_dashboard(config: &ResolvedConfig, color: ColorConfig) -> Result<(), TuiError> {
    let endpoints = config.endpoints().map_err(AppError::from)?;
    info!(
        rest = %endpoints.rest_base(),
        realtime = %endpoints.realtime_url(),
        "Resolved endpoints"
    );

    let channel_settings = config.channel_settings(&endpoints);
    let server_label = endpoints.rest_base().to_string();
    let rest = RestClient::new(endpoints, config.request_timeout())
        .map_err(|e| AppError::Transport(e.to_string()))?;
    let transport = TransportClient::new(Arc::new(rest), Some(channel_settings));

    let session = load_session(config);
    let app_state = AppState::new(config.page_size, config.live_prepend, session.as_ref());

    let mut app = TuiApp::new(
        &transport,
        app_state,
        DashboardStyles::new(color),
        server_label,
    )?;
    transport.connect();

    let result = app.run();

    restore_terminal()?;
    drop(app);
    transport.shutdown();

    result
}

/// Restore terminal to normal state
///
/// Disables raw mode and leaves alternate screen
pub fn restore_terminal() -> Result<(), TuiError> {
    disable_raw_mode()?;
    io::stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}
