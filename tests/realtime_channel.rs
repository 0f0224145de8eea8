//! Integration tests: realtime channel against a local websocket server.
//!
//! The server side speaks just enough Engine.IO / Socket.IO to complete the
//! handshake and push events.

use argus::transport::{ChannelSettings, RealtimeChannel, SubscriptionRegistry};
use reqwest::Url;
use serde_json::json;
use std::net::TcpListener;
use std::sync::mpsc;
use std::time::{Duration, Instant};
use tungstenite::Message;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

const OPEN_FRAME: &str = r#"0{"sid":"s1","upgrades":[],"pingInterval":25000,"pingTimeout":20000}"#;

/// Accept `sessions` websocket connections in turn, handshake each one,
/// send `frames`, then close it.
fn serve(sessions: usize, frames: Vec<String>) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    std::thread::spawn(move || {
        for stream in listener.incoming().take(sessions) {
            let Ok(stream) = stream else { continue };
            let Ok(mut ws) = tungstenite::accept(stream) else {
                continue;
            };
            ws.send(Message::Text(OPEN_FRAME.to_string())).unwrap();

            // Wait for the namespace connect.
            loop {
                match ws.read() {
                    Ok(Message::Text(frame)) if frame == "40" => break,
                    Ok(_) => {}
                    Err(_) => return,
                }
            }
            ws.send(Message::Text(r#"40{"sid":"n1"}"#.to_string())).unwrap();
            for frame in &frames {
                ws.send(Message::Text(frame.clone())).unwrap();
            }
            let _ = ws.close(None);
            // Let the close handshake finish.
            while ws.read().is_ok() {}
        }
    });

    Url::parse(&format!(
        "ws://{addr}/argus-websocket-server/?EIO=4&transport=websocket"
    ))
    .unwrap()
}

fn settings(url: Url) -> ChannelSettings {
    ChannelSettings {
        url,
        reconnect_delay: Duration::from_millis(20),
        max_reconnect_delay: Duration::from_millis(100),
        connect_timeout: Duration::from_secs(2),
    }
}

fn new_request_frame(id: &str) -> String {
    let payload = json!({
        "_id": id,
        "request": {"method": "POST", "path": "/a", "duration": 12, "timestamp": 1000},
        "response": {"status": 500}
    });
    format!(r#"42["new_request",{payload}]"#)
}

#[test]
fn pushes_reach_subscribers_in_order() {
    let url = serve(1, vec![new_request_frame("x1"), new_request_frame("x2")]);
    let registry = SubscriptionRegistry::new();
    let (tx, rx) = mpsc::channel();
    let _sub = registry.subscribe("new_request", move |payload| {
        let _ = tx.send(payload["_id"].as_str().unwrap_or_default().to_string());
    });

    let channel = RealtimeChannel::spawn(settings(url), registry.clone()).unwrap();
    assert!(channel.is_running());

    assert_eq!(rx.recv_timeout(RECV_TIMEOUT).unwrap(), "x1");
    assert_eq!(rx.recv_timeout(RECV_TIMEOUT).unwrap(), "x2");
    channel.shutdown();
    assert!(!channel.is_running());
}

#[test]
fn lifecycle_events_are_published() {
    let url = serve(2, Vec::new());
    let registry = SubscriptionRegistry::new();
    let (tx, rx) = mpsc::channel();

    let on_connect = tx.clone();
    let _connect = registry.subscribe("connect", move |_| {
        let _ = on_connect.send("connect".to_string());
    });
    let _disconnect = registry.subscribe("disconnect", move |payload| {
        let _ = tx.send(format!("disconnect: {}", payload.as_str().unwrap_or("")));
    });

    let channel = RealtimeChannel::spawn(settings(url), registry.clone()).unwrap();

    assert_eq!(rx.recv_timeout(RECV_TIMEOUT).unwrap(), "connect");
    assert!(rx
        .recv_timeout(RECV_TIMEOUT)
        .unwrap()
        .starts_with("disconnect: "));
    // Reconnects after the server drops the first session.
    assert_eq!(rx.recv_timeout(RECV_TIMEOUT).unwrap(), "connect");
    channel.shutdown();
}

#[test]
fn unreachable_server_reports_connect_error_without_disconnect() {
    // Bind then drop to get a port nobody listens on.
    let addr = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
    let url = Url::parse(&format!("ws://{addr}/?EIO=4&transport=websocket")).unwrap();

    let registry = SubscriptionRegistry::new();
    let (tx, rx) = mpsc::channel();
    let on_error = tx.clone();
    let _error = registry.subscribe("connect_error", move |_| {
        let _ = on_error.send("connect_error");
    });
    let _disconnect = registry.subscribe("disconnect", move |_| {
        let _ = tx.send("disconnect");
    });

    let channel = RealtimeChannel::spawn(settings(url), registry.clone()).unwrap();
    assert_eq!(rx.recv_timeout(RECV_TIMEOUT).unwrap(), "connect_error");
    assert_eq!(rx.recv_timeout(RECV_TIMEOUT).unwrap(), "connect_error");
    channel.shutdown();
}

/// Accept connections and hold them open without ever answering.
fn serve_silently() -> (Url, mpsc::Receiver<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let (accepted_tx, accepted_rx) = mpsc::channel();

    std::thread::spawn(move || {
        let mut held = Vec::new();
        for stream in listener.incoming() {
            let Ok(stream) = stream else { continue };
            held.push(stream);
            let _ = accepted_tx.send(());
        }
    });

    let url = Url::parse(&format!("ws://{addr}/?EIO=4&transport=websocket")).unwrap();
    (url, accepted_rx)
}

#[test]
fn shutdown_is_prompt_while_upgrade_is_unanswered() {
    let (url, accepted) = serve_silently();
    let mut settings = settings(url);
    settings.connect_timeout = Duration::from_secs(30);

    let channel = RealtimeChannel::spawn(settings, SubscriptionRegistry::new()).unwrap();
    accepted.recv_timeout(RECV_TIMEOUT).unwrap();
    std::thread::sleep(Duration::from_millis(300));

    let started = Instant::now();
    channel.shutdown();
    let elapsed = started.elapsed();
    assert!(elapsed < Duration::from_secs(2), "shutdown took {elapsed:?}");
}

#[test]
fn unanswered_upgrade_times_out_as_connect_error() {
    let (url, _accepted) = serve_silently();
    let mut settings = settings(url);
    settings.connect_timeout = Duration::from_millis(300);

    let registry = SubscriptionRegistry::new();
    let (tx, rx) = mpsc::channel();
    let _error = registry.subscribe("connect_error", move |payload| {
        let _ = tx.send(payload.as_str().unwrap_or_default().to_string());
    });

    let channel = RealtimeChannel::spawn(settings, registry.clone()).unwrap();
    let reason = rx.recv_timeout(RECV_TIMEOUT).unwrap();
    assert!(reason.contains("timed out"), "{reason}");
    channel.shutdown();
}
