//! Socket connection manager against real local WebSocket servers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use shared::{ConnectionState, LineEvent, LineOrigin};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use viewer::services::socket::{ConnectionHandle, ConnectionSettings, SocketConnection, SocketSignals};
use viewer::WebSocketConnector;

/// Local server that greets every connection with fixed messages, then
/// echoes nothing and waits for the client to go away.
struct TestServer {
    url: String,
    accepted: Arc<AtomicUsize>,
    finished: Arc<AtomicUsize>,
    task: JoinHandle<()>,
}

impl TestServer {
    async fn start(greeting: Vec<&'static str>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());
        let accepted = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicUsize::new(0));

        let task = {
            let accepted = Arc::clone(&accepted);
            let finished = Arc::clone(&finished);
            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    let greeting = greeting.clone();
                    let accepted = Arc::clone(&accepted);
                    let finished = Arc::clone(&finished);
                    tokio::spawn(async move {
                        let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else {
                            return;
                        };
                        accepted.fetch_add(1, Ordering::SeqCst);
                        for text in greeting {
                            if ws.send(Message::Text(text.to_string())).await.is_err() {
                                break;
                            }
                        }
                        // Drive the stream so the client's close frame is answered
                        while let Some(Ok(_)) = ws.next().await {}
                        finished.fetch_add(1, Ordering::SeqCst);
                    });
                }
            })
        };

        Self {
            url,
            accepted,
            finished,
            task,
        }
    }

    fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

struct Harness {
    handle: ConnectionHandle,
    target_tx: watch::Sender<Option<String>>,
    _auto_tx: watch::Sender<bool>,
    _trigger_tx: broadcast::Sender<()>,
    states: watch::Receiver<ConnectionState>,
    lines: mpsc::UnboundedReceiver<LineEvent>,
}

fn start_manager(target: Option<String>, settings: ConnectionSettings) -> Harness {
    let (target_tx, target_rx) = watch::channel(target);
    let (auto_tx, auto_rx) = watch::channel(false);
    let (trigger_tx, trigger_rx) = broadcast::channel(4);
    let (state_tx, states) = watch::channel(ConnectionState::Closed);
    let (line_tx, lines) = mpsc::unbounded_channel();

    let manager = SocketConnection::new(
        "integration",
        WebSocketConnector::new(&settings),
        &settings,
        SocketSignals {
            target: target_rx,
            auto_reconnect: auto_rx,
            reconnect: trigger_rx,
        },
        Arc::new(state_tx),
        Arc::new(line_tx),
    );

    Harness {
        handle: manager.spawn(),
        target_tx,
        _auto_tx: auto_tx,
        _trigger_tx: trigger_tx,
        states,
        lines,
    }
}

async fn wait_state(states: &mut watch::Receiver<ConnectionState>, wanted: ConnectionState) {
    timeout(Duration::from_secs(5), states.wait_for(|state| *state == wanted))
        .await
        .unwrap_or_else(|_| panic!("state {} not reached", wanted))
        .expect("manager alive");
}

async fn next_line(lines: &mut mpsc::UnboundedReceiver<LineEvent>) -> LineEvent {
    timeout(Duration::from_secs(5), lines.recv())
        .await
        .expect("line in time")
        .expect("manager alive")
}

async fn wait_for(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("condition not met in time");
}

#[tokio::test]
async fn test_structured_and_plain_messages_become_lines() {
    let server = TestServer::start(vec![r#"{"sentence":"hello"}"#, "plain text", r#"{"other":1}"#]).await;
    let mut harness = start_manager(Some(server.url.clone()), ConnectionSettings::default());

    wait_state(&mut harness.states, ConnectionState::Open).await;

    let first = next_line(&mut harness.lines).await;
    assert_eq!(first.text, "hello");
    assert_eq!(first.origin, LineOrigin::Socket);
    assert_eq!(next_line(&mut harness.lines).await.text, "plain text");
    assert_eq!(next_line(&mut harness.lines).await.text, r#"{"other":1}"#);

    harness.handle.shutdown().await;
    wait_for(|| server.finished() == 1).await;
}

#[tokio::test]
async fn test_disconnect_closes_and_keeps_target() {
    let server = TestServer::start(vec![]).await;
    let mut harness = start_manager(Some(server.url.clone()), ConnectionSettings::default());
    wait_state(&mut harness.states, ConnectionState::Open).await;

    harness.handle.disconnect();
    wait_state(&mut harness.states, ConnectionState::Closed).await;
    wait_for(|| server.finished() == 1).await;

    harness.handle.connect();
    wait_state(&mut harness.states, ConnectionState::Open).await;
    assert_eq!(server.accepted(), 2);

    harness.handle.shutdown().await;
}

#[tokio::test]
async fn test_target_change_moves_to_new_server() {
    let first = TestServer::start(vec!["from first"]).await;
    let second = TestServer::start(vec!["from second"]).await;
    let mut harness = start_manager(Some(first.url.clone()), ConnectionSettings::default());

    assert_eq!(next_line(&mut harness.lines).await.text, "from first");

    harness.target_tx.send_replace(Some(second.url.clone()));
    assert_eq!(next_line(&mut harness.lines).await.text, "from second");

    wait_for(|| first.finished() == 1).await;
    assert_eq!(first.accepted(), 1);
    assert_eq!(second.accepted(), 1);

    harness.handle.shutdown().await;
    wait_for(|| second.finished() == 1).await;
}

#[tokio::test]
async fn test_connect_timeout_against_silent_listener() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    // Accept TCP but never answer the handshake
    let silent = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });

    let settings = ConnectionSettings {
        connect_timeout: Duration::from_millis(200),
        ..ConnectionSettings::default()
    };
    let mut harness = start_manager(Some(url), settings);

    wait_state(&mut harness.states, ConnectionState::Connecting).await;
    wait_state(&mut harness.states, ConnectionState::Closed).await;
    assert!(harness.lines.try_recv().is_err());

    harness.handle.shutdown().await;
    silent.abort();
}

#[tokio::test]
async fn test_malformed_target_publishes_closed() {
    let mut harness = start_manager(Some("not a socket address".to_string()), ConnectionSettings::default());

    wait_state(&mut harness.states, ConnectionState::Closed).await;
    assert_eq!(*harness.states.borrow(), ConnectionState::Closed);

    harness.handle.shutdown().await;
}
