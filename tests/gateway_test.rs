//! End-to-end tests: presence convergence, message delivery, liveness
//! eviction, and the REST account/history flow, driven over real sockets
//! against an in-process server.

#![allow(clippy::panic, clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use courier_gateway::api;
use courier_gateway::app_state::{AppState, WsSettings};
use courier_gateway::auth::JwtIdentityResolver;
use courier_gateway::domain::{ConnectionRegistry, Identity, MessageDraft};
use courier_gateway::persistence::{InMemoryStore, MessageStore, UploadStore, UserStore};
use courier_gateway::service::ChatService;
use courier_gateway::ws::handler::ws_handler;

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Probe timings that keep the monitor out of the way of non-liveness tests.
const SLOW_PROBES: WsSettings = WsSettings {
    ping_interval: Duration::from_secs(30),
    pong_timeout: Duration::from_secs(5),
};

/// Probe timings that evict an unresponsive peer within ~0.5s.
const FAST_PROBES: WsSettings = WsSettings {
    ping_interval: Duration::from_millis(300),
    pong_timeout: Duration::from_millis(200),
};

/// Starts the gateway on an ephemeral port with the in-memory store.
/// Returns the address, the shared state (for direct store access), and
/// the upload dir guard.
async fn start_server(ws: WsSettings) -> (String, AppState, tempfile::TempDir) {
    let store = Arc::new(InMemoryStore::new());
    let users: Arc<dyn UserStore> = store.clone();
    let messages: Arc<dyn MessageStore> = store.clone();

    let upload_dir = tempfile::tempdir().expect("temp dir");
    let uploads = Arc::new(UploadStore::new(upload_dir.path()));
    uploads.ensure_dir().await.expect("upload dir");

    let registry = Arc::new(ConnectionRegistry::new());
    let chat = Arc::new(ChatService::new(registry, Arc::clone(&messages)));
    let resolver = Arc::new(JwtIdentityResolver::new("integration-secret", 1));

    let state = AppState {
        chat,
        users,
        messages,
        resolver,
        uploads,
        ws,
    };

    let app = Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws_handler))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });

    (format!("127.0.0.1:{}", addr.port()), state, upload_dir)
}

/// Creates a user directly in the store and returns (identity, token).
async fn create_user(state: &AppState, username: &str) -> (Identity, String) {
    let identity = state
        .users
        .create(username, "unused-hash")
        .await
        .expect("create user");
    let token = state.resolver.issue(&identity).expect("issue token");
    (identity, token)
}

/// Opens a WebSocket connection authenticated via the query parameter.
async fn connect_ws(addr: &str, token: &str) -> WsClient {
    let (socket, _response) = connect_async(format!("ws://{addr}/ws?token={token}"))
        .await
        .expect("ws connect");
    socket
}

/// Reads text frames until one satisfies the predicate, within `wait`.
async fn next_matching(socket: &mut WsClient, wait: Duration, pred: impl Fn(&Value) -> bool) -> Value {
    let deadline = tokio::time::Instant::now() + wait;
    loop {
        let remaining = deadline
            .checked_duration_since(tokio::time::Instant::now())
            .unwrap_or_else(|| panic!("no matching frame within {wait:?}"));
        let frame = tokio::time::timeout(remaining, socket.next())
            .await
            .unwrap_or_else(|_| panic!("no matching frame within {wait:?}"));
        match frame {
            Some(Ok(Message::Text(text))) => {
                let value: Value = serde_json::from_str(text.as_str()).expect("json frame");
                if pred(&value) {
                    return value;
                }
            }
            Some(Ok(_)) => {}
            other => panic!("socket closed while waiting: {other:?}"),
        }
    }
}

/// Waits for a presence frame whose online set has exactly `usernames`.
async fn wait_for_online(socket: &mut WsClient, usernames: &[&str]) -> Value {
    let mut expected: Vec<&str> = usernames.to_vec();
    expected.sort_unstable();
    next_matching(socket, Duration::from_secs(5), move |value| {
        let Some(online) = value.get("online").and_then(Value::as_array) else {
            return false;
        };
        let mut names: Vec<&str> = online
            .iter()
            .filter_map(|p| p.get("username").and_then(Value::as_str))
            .collect();
        names.sort_unstable();
        names == expected
    })
    .await
}

#[tokio::test]
async fn presence_and_message_delivery() {
    let (addr, state, _uploads) = start_server(SLOW_PROBES).await;
    let (alice, alice_token) = create_user(&state, "alice").await;
    let (bob, bob_token) = create_user(&state, "bob").await;

    let mut alice_ws = connect_ws(&addr, &alice_token).await;
    wait_for_online(&mut alice_ws, &["alice"]).await;

    let mut bob_ws = connect_ws(&addr, &bob_token).await;

    // Both appear online to each other.
    wait_for_online(&mut alice_ws, &["alice", "bob"]).await;
    wait_for_online(&mut bob_ws, &["alice", "bob"]).await;

    // u1 sends {recepient: u2, text: "hi"}.
    let payload = json!({"recepient": bob.id, "text": "hi"}).to_string();
    alice_ws
        .send(Message::Text(payload.into()))
        .await
        .expect("send");

    // u2's connection receives the routed message with the stored id.
    let delivered = next_matching(&mut bob_ws, Duration::from_secs(5), |v| {
        v.get("text").and_then(Value::as_str) == Some("hi")
    })
    .await;
    assert_eq!(delivered.get("sender"), Some(&json!(alice.id)));
    assert_eq!(delivered.get("recepient"), Some(&json!(bob.id)));
    assert_eq!(delivered.get("file"), Some(&Value::Null));
    assert!(delivered.get("_id").is_some_and(Value::is_i64));

    // The store gained exactly one message, in order.
    let stored = state
        .messages
        .conversation(alice.id, bob.id, None)
        .await
        .expect("query");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored.first().and_then(|m| m.text.as_deref()), Some("hi"));
}

#[tokio::test]
async fn invalid_messages_are_silently_dropped() {
    let (addr, state, _uploads) = start_server(SLOW_PROBES).await;
    let (alice, alice_token) = create_user(&state, "alice").await;
    let (bob, bob_token) = create_user(&state, "bob").await;

    let mut alice_ws = connect_ws(&addr, &alice_token).await;
    let mut bob_ws = connect_ws(&addr, &bob_token).await;
    wait_for_online(&mut bob_ws, &["alice", "bob"]).await;

    // No recipient, then no body: neither may persist or deliver.
    for payload in [json!({"text": "hi"}), json!({"recepient": bob.id})] {
        alice_ws
            .send(Message::Text(payload.to_string().into()))
            .await
            .expect("send");
    }
    tokio::time::sleep(Duration::from_millis(300)).await;

    let stored = state
        .messages
        .conversation(alice.id, bob.id, None)
        .await
        .expect("query");
    assert!(stored.is_empty());

    let nothing = tokio::time::timeout(Duration::from_millis(300), bob_ws.next()).await;
    assert!(nothing.is_err(), "unexpected frame: {nothing:?}");
}

#[tokio::test]
async fn unresponsive_connection_is_evicted_and_presence_updates() {
    let (addr, state, _uploads) = start_server(FAST_PROBES).await;
    let (_alice, alice_token) = create_user(&state, "alice").await;
    let (_bob, bob_token) = create_user(&state, "bob").await;

    let mut alice_ws = connect_ws(&addr, &alice_token).await;
    let bob_ws = connect_ws(&addr, &bob_token).await;
    wait_for_online(&mut alice_ws, &["alice", "bob"]).await;

    // Bob stops responding to probes: the socket stays open but is never
    // polled again, so pings go unanswered.
    std::mem::forget(bob_ws);

    // Within one probe interval + timeout alice sees bob gone.
    wait_for_online(&mut alice_ws, &["alice"]).await;
    assert_eq!(state.chat.registry().online_count().await, 1);
}

#[tokio::test]
async fn rejects_websocket_without_valid_token() {
    let (addr, _state, _uploads) = start_server(SLOW_PROBES).await;

    let no_token = connect_async(format!("ws://{addr}/ws")).await;
    assert!(no_token.is_err());

    let bad_token = connect_async(format!("ws://{addr}/ws?token=bogus")).await;
    assert!(bad_token.is_err());
}

#[tokio::test]
async fn file_message_persists_for_offline_recipient() {
    let (addr, state, uploads) = start_server(SLOW_PROBES).await;
    let (alice, alice_token) = create_user(&state, "alice").await;
    let (bob, bob_token) = create_user(&state, "bob").await;

    // Bob is offline; alice sends a file message.
    let mut alice_ws = connect_ws(&addr, &alice_token).await;
    wait_for_online(&mut alice_ws, &["alice"]).await;

    let payload = json!({
        "recepient": bob.id,
        "file": {"name": "note.txt", "data": "data:text/plain;base64,aGVsbG8="}
    });
    alice_ws
        .send(Message::Text(payload.to_string().into()))
        .await
        .expect("send");

    // The message persists with a resolvable file reference.
    let stored = loop {
        let messages = state
            .messages
            .conversation(alice.id, bob.id, None)
            .await
            .expect("query");
        if !messages.is_empty() {
            break messages;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    };
    let file = stored
        .first()
        .and_then(|m| m.file.clone())
        .expect("file reference");
    assert!(file.ends_with(".txt"));
    let content = std::fs::read(uploads.path().join(&file)).expect("stored blob");
    assert_eq!(content, b"hello");

    // Bob later connects and fetches history over REST.
    let client = reqwest::Client::new();
    let history: Value = client
        .get(format!("http://{addr}/messages/{}", alice.id))
        .header("Cookie", format!("token={bob_token}"))
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("json");
    let entries = history.as_array().expect("array");
    assert_eq!(entries.len(), 1);
    assert_eq!(
        entries.first().and_then(|e| e.get("file")),
        Some(&json!(file))
    );
}

#[tokio::test]
async fn rest_account_and_history_flow() {
    let (addr, state, _uploads) = start_server(SLOW_PROBES).await;
    let client = reqwest::Client::new();
    let base = format!("http://{addr}");

    // Register alice.
    let register = client
        .post(format!("{base}/register"))
        .json(&json!({"username": "alice", "password": "hunter2"}))
        .send()
        .await
        .expect("register");
    assert_eq!(register.status(), 201);
    let alice_cookie = register
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
        .expect("token cookie");
    let alice_id = register
        .json::<Value>()
        .await
        .expect("json")
        .get("id")
        .cloned()
        .expect("id");

    // Duplicate username conflicts.
    let duplicate = client
        .post(format!("{base}/register"))
        .json(&json!({"username": "alice", "password": "other"}))
        .send()
        .await
        .expect("register");
    assert_eq!(duplicate.status(), 409);

    // Wrong password is unauthorized.
    let wrong = client
        .post(format!("{base}/login"))
        .json(&json!({"username": "alice", "password": "wrong"}))
        .send()
        .await
        .expect("login");
    assert_eq!(wrong.status(), 401);

    // Correct login returns the same id.
    let login = client
        .post(format!("{base}/login"))
        .json(&json!({"username": "alice", "password": "hunter2"}))
        .send()
        .await
        .expect("login");
    assert_eq!(login.status(), 200);
    assert_eq!(
        login.json::<Value>().await.expect("json").get("id"),
        Some(&alice_id)
    );

    // Profile resolves the cookie.
    let profile: Value = client
        .get(format!("{base}/profile"))
        .header("Cookie", &alice_cookie)
        .send()
        .await
        .expect("profile")
        .json()
        .await
        .expect("json");
    assert_eq!(profile.get("userId"), Some(&alice_id));
    assert_eq!(profile.get("username"), Some(&json!("alice")));

    // People lists everyone.
    let (bob, _bob_token) = create_user(&state, "bob").await;
    let people: Value = client
        .get(format!("{base}/people"))
        .send()
        .await
        .expect("people")
        .json()
        .await
        .expect("json");
    let usernames: Vec<&str> = people
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|p| p.get("username").and_then(Value::as_str))
        .collect();
    assert_eq!(usernames, vec!["alice", "bob"]);

    // History between alice and bob, via the router.
    let alice_identity = Identity::new(
        serde_json::from_value(alice_id.clone()).expect("uuid"),
        "alice",
    );
    state
        .chat
        .route(
            &alice_identity,
            MessageDraft::new(bob.id, Some("hello bob".to_string()), None),
        )
        .await
        .expect("route");

    let history: Value = client
        .get(format!("{base}/messages/{}", bob.id))
        .header("Cookie", &alice_cookie)
        .send()
        .await
        .expect("messages")
        .json()
        .await
        .expect("json");
    let entries = history.as_array().expect("array");
    assert_eq!(entries.len(), 1);
    let entry = entries.first().expect("entry");
    assert_eq!(entry.get("text"), Some(&json!("hello bob")));
    assert_eq!(entry.get("sender"), Some(&alice_id));
    assert!(entry.get("createdAt").is_some());

    // Unauthenticated history access is rejected.
    let unauthorized = client
        .get(format!("{base}/messages/{}", bob.id))
        .send()
        .await
        .expect("messages");
    assert_eq!(unauthorized.status(), 401);

    // Health endpoint.
    let health = client
        .get(format!("{base}/health"))
        .send()
        .await
        .expect("health");
    assert_eq!(health.status(), 200);
}
