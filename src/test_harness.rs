//! Acceptance Test Harness for TUI testing
//!
//! Provides a high-level API for acceptance testing user stories by wrapping
//! TuiApp<TestBackend> with a scripted log server and convenient methods for
//! simulating key presses and realtime pushes.

use crate::model::{
    FetchError, FetchedPage, Header, LogEntryDetail, LogEntrySummary, LogId, PayloadFragment,
    RequestDetail, ResponseDetail, ServerConfig,
};
use crate::session::MemorySession;
use crate::state::{AppState, PrependPolicy};
use crate::transport::dispatch::EVENT_NEW_REQUEST;
use crate::transport::{LogApi, TransportClient};
use crate::view::{ColorConfig, DashboardStyles, TuiApp};
use chrono::{DateTime, TimeZone, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::backend::TestBackend;
use ratatui::Terminal;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Upper bound on waiting for dispatched fetches to complete.
const SETTLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Convert a ratatui buffer to a string representation.
///
/// Captures the visual output character by character, preserving layout.
/// Empty trailing lines are removed.
pub fn buffer_to_string(buffer: &ratatui::buffer::Buffer) -> String {
    let area = buffer.area();
    let mut lines = Vec::new();

    for y in area.top()..area.bottom() {
        let mut line = String::new();
        for x in area.left()..area.right() {
            line.push_str(buffer[(x, y)].symbol());
        }
        lines.push(line.trim_end().to_string());
    }

    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}

/// Timestamp of the newest entry on page 1; older entries step back one second.
pub fn base_time() -> DateTime<Utc> {
    Utc.timestamp_millis_opt(1_700_000_000_000).unwrap()
}

/// Summary with the id `p{page}e{index}` used by [`ScriptedApi`].
pub fn scripted_summary(page: u32, index: u32, page_size: u32) -> LogEntrySummary {
    let id = format!("p{page}e{index}");
    let age_secs = i64::from((page - 1) * page_size + index);
    LogEntrySummary::new(
        Some(LogId::new(id.clone()).unwrap()),
        "GET",
        format!("/{id}"),
        200,
        4.0,
        base_time() - chrono::Duration::seconds(age_secs),
    )
    .unwrap()
}

/// Detail record matching [`scripted_summary`]'s shape for any summary.
pub fn scripted_detail(summary: LogEntrySummary) -> LogEntryDetail {
    let request = RequestDetail {
        hostname: "api.test".to_string(),
        ip_address: "127.0.0.1".to_string(),
        method: summary.method().to_string(),
        path: summary.path().to_string(),
        url: format!("http://api.test{}", summary.path()),
        headers: vec![Header::new("accept", "application/json")],
        body: Vec::new(),
    };
    let response = ResponseDetail {
        status: summary.status(),
        body: vec![PayloadFragment::new(serde_json::json!({"ok": true}))],
    };
    LogEntryDetail::new(summary, request, response)
}

/// In-process log server with a fixed number of entries.
pub struct ScriptedApi {
    total: u64,
    config: Result<ServerConfig, FetchError>,
    page_delays: HashMap<u32, Duration>,
    failing_pages: Mutex<HashMap<u32, FetchError>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedApi {
    pub fn new(total: u64) -> Self {
        Self {
            total,
            config: Ok(ServerConfig::default()),
            page_delays: HashMap::new(),
            failing_pages: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn requiring_auth(mut self) -> Self {
        self.config = Ok(ServerConfig {
            authentication: true,
        });
        self
    }

    pub fn with_page_delay(mut self, page: u32, delay: Duration) -> Self {
        self.page_delays.insert(page, delay);
        self
    }

    /// Fail the next fetch of `page` once.
    pub fn fail_page_once(&self, page: u32, error: FetchError) {
        self.failing_pages.lock().unwrap().insert(page, error);
    }

    /// Requests seen so far, e.g. `page 2` or `detail p1e0`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl LogApi for ScriptedApi {
    fn fetch_page(&self, page: u32, page_size: u32) -> Result<FetchedPage, FetchError> {
        self.record(format!("page {page}"));
        if let Some(delay) = self.page_delays.get(&page) {
            std::thread::sleep(*delay);
        }
        if let Some(error) = self.failing_pages.lock().unwrap().remove(&page) {
            return Err(error);
        }

        let start = u64::from((page - 1) * page_size);
        let count = self.total.saturating_sub(start).min(u64::from(page_size)) as u32;
        Ok(FetchedPage {
            entries: (0..count)
                .map(|i| scripted_summary(page, i, page_size))
                .collect(),
            total_count: self.total,
            current_page: page,
        })
    }

    fn fetch_detail(&self, log_id: &LogId) -> Result<LogEntryDetail, FetchError> {
        self.record(format!("detail {log_id}"));
        let raw = log_id.as_str().trim_start_matches('p');
        let parsed = raw
            .split_once('e')
            .and_then(|(p, e)| Some((p.parse::<u32>().ok()?, e.parse::<u32>().ok()?)));
        match parsed {
            Some((page, index)) => Ok(scripted_detail(scripted_summary(page, index, 10))),
            None => Err(FetchError::NotFound {
                log_id: log_id.to_string(),
            }),
        }
    }

    fn fetch_config(&self) -> Result<ServerConfig, FetchError> {
        self.record("config".to_string());
        self.config.clone()
    }
}

/// Test harness for acceptance testing
///
/// Wraps TuiApp<TestBackend> to provide a clean API for simulating user
/// interactions in acceptance tests.
pub struct AcceptanceTestHarness {
    app: TuiApp<TestBackend>,
    api: Arc<ScriptedApi>,
    transport: TransportClient,
    running: bool,
}

impl AcceptanceTestHarness {
    /// Dashboard of page size 10 against `api`, 100x30, not yet started.
    pub fn new(api: ScriptedApi, authenticated: bool) -> Self {
        Self::with_options(api, authenticated, PrependPolicy::Always, 100, 30)
    }

    pub fn with_options(
        api: ScriptedApi,
        authenticated: bool,
        policy: PrependPolicy,
        width: u16,
        height: u16,
    ) -> Self {
        let api = Arc::new(api);
        let transport = TransportClient::new(api.clone(), None);
        let terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        let app = TuiApp::with_terminal(
            terminal,
            &transport,
            AppState::new(10, policy, &MemorySession::new(authenticated)),
            DashboardStyles::new(ColorConfig::disabled()),
            "http://api.test/logs".to_string(),
        );
        Self {
            app,
            api,
            transport,
            running: true,
        }
    }

    /// Start the dashboard and wait for the config check, then for the
    /// first page if the gate opened.
    pub fn start(&mut self) {
        self.app.start();
        self.settle(1);
        if self.state().pagination.is_loading() {
            self.settle(1);
        }
    }

    /// Apply `expected` transport events, waiting for in-flight fetches.
    ///
    /// Returns how many were applied; fewer than `expected` means the
    /// timeout ran out.
    pub fn settle(&mut self, expected: usize) -> usize {
        let deadline = Instant::now() + SETTLE_TIMEOUT;
        let mut applied = 0;
        while applied < expected {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            applied += self.app.wait_for_events(remaining);
        }
        applied
    }

    /// Press a key with no modifiers.
    pub fn press(&mut self, code: KeyCode) {
        self.press_with(code, KeyModifiers::NONE);
    }

    pub fn press_with(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        if self.running && self.app.handle_key(KeyEvent::new(code, modifiers)) {
            self.running = false;
        }
    }

    /// Deliver a `new_request` payload as the realtime channel would.
    pub fn push_realtime(&mut self, payload: serde_json::Value) {
        self.transport.registry().dispatch(EVENT_NEW_REQUEST, &payload);
        self.settle(1);
    }

    /// Deliver a reserved channel event (`connect`, `disconnect`, ...).
    pub fn channel_event(&mut self, event: &str, payload: serde_json::Value) {
        self.transport.registry().dispatch(event, &payload);
        self.settle(1);
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn state(&self) -> &AppState {
        self.app.app_state()
    }

    pub fn api(&self) -> &ScriptedApi {
        &self.api
    }

    pub fn transport(&self) -> &TransportClient {
        &self.transport
    }

    /// Render and return the screen as text.
    pub fn screen(&mut self) -> String {
        self.app.draw().unwrap();
        buffer_to_string(self.app.terminal().backend().buffer())
    }

    /// Ids of the table rows, top to bottom.
    pub fn row_ids(&self) -> Vec<String> {
        self.state()
            .feed
            .entries()
            .map(|e| e.log_id().map(|id| id.to_string()).unwrap_or_default())
            .collect()
    }
}

/// `new_request` payload in the nested wire shape.
pub fn realtime_payload(id: Option<&str>, path: &str, at: DateTime<Utc>) -> serde_json::Value {
    let mut payload = serde_json::json!({
        "request": {
            "method": "POST",
            "path": path,
            "duration": 7,
            "timestamp": at.timestamp_millis(),
        },
        "response": {"status": 201},
    });
    if let Some(id) = id {
        payload["_id"] = serde_json::Value::String(id.to_string());
    }
    payload
}
