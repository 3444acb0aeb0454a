//! Boots the full application on an ephemeral port for end-to-end tests.
#![allow(dead_code)]

use futures::{SinkExt, StreamExt};
use migration::{Migrator, MigratorTrait};
use realtime::Hub;
use serde_json::{json, Value};
use service::config::Config;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{tungstenite::Message, MaybeTlsStream, WebSocketStream};

pub type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct TestServer {
    pub addr: String,
    pub hub: Hub,
    pub client: reqwest::Client,
}

/// A logged-in user: their id and bearer token.
pub struct Session {
    pub id: i64,
    pub token: String,
}

/// Application state over a fresh in-memory database, plus its hub handle.
pub async fn test_app_state() -> (web::AppState, Hub) {
    // A single pooled connection keeps every query on the same in-memory database.
    let config = Config::from_args([
        "wasatext",
        "--database-url",
        "sqlite::memory:",
        "--db-max-connections",
        "1",
        "--outbound-queue-capacity",
        "64",
    ])
    .unwrap();

    let db = Arc::new(service::init_database(&config).await.unwrap());
    Migrator::up(db.as_ref(), None).await.unwrap();

    let (hub, _control_loop) = Hub::spawn(config.hub_channel_capacity);
    let publisher = web::ws::event_publisher(Arc::clone(&db), hub.clone());
    let app_state = web::AppState::new(
        service::AppState::new(config, &db),
        hub.clone(),
        publisher,
    );
    (app_state, hub)
}

pub async fn start_test_server() -> TestServer {
    let (app_state, hub) = test_app_state().await;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    tokio::spawn(async move {
        web::serve(listener, app_state, std::future::pending())
            .await
            .unwrap();
    });

    TestServer {
        addr,
        hub,
        client: reqwest::Client::new(),
    }
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// POST /session and return the envelope.
    pub async fn login_envelope(&self, name: &str) -> Value {
        self.client
            .post(self.url("/session"))
            .json(&json!({ "name": name }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap()
    }

    pub async fn login(&self, name: &str) -> Session {
        let envelope = self.login_envelope(name).await;
        Session {
            id: envelope["data"]["user"]["id"].as_i64().unwrap(),
            token: envelope["data"]["token"].as_str().unwrap().to_string(),
        }
    }

    pub async fn get(&self, session: &Session, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(&session.token)
            .send()
            .await
            .unwrap()
    }

    pub async fn post(&self, session: &Session, path: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(&session.token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    pub async fn put(&self, session: &Session, path: &str, body: Value) -> reqwest::Response {
        self.client
            .put(self.url(path))
            .bearer_auth(&session.token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    pub async fn delete(&self, session: &Session, path: &str) -> reqwest::Response {
        self.client
            .delete(self.url(path))
            .bearer_auth(&session.token)
            .send()
            .await
            .unwrap()
    }

    /// Creates a conversation as `creator` and returns its id.
    pub async fn create_conversation(
        &self,
        creator: &Session,
        name: Option<&str>,
        members: &[&Session],
    ) -> i64 {
        let member_ids: Vec<i64> = members.iter().map(|member| member.id).collect();
        let envelope: Value = self
            .post(
                creator,
                "/conversations",
                json!({ "name": name, "memberIds": member_ids }),
            )
            .await
            .json()
            .await
            .unwrap();
        envelope["data"]["conversation"]["id"].as_i64().unwrap()
    }

    /// Sends a text message and returns its id.
    pub async fn send_message(&self, sender: &Session, conversation_id: i64, content: &str) -> i64 {
        let envelope: Value = self
            .post(
                sender,
                &format!("/conversations/{conversation_id}/messages"),
                json!({ "content": content }),
            )
            .await
            .json()
            .await
            .unwrap();
        envelope["data"]["message"]["id"].as_i64().unwrap()
    }

    pub async fn connect(&self, session: &Session) -> Socket {
        let url = format!("ws://{}/ws?token={}", self.addr, session.token);
        let (socket, _) = tokio_tungstenite::connect_async(url).await.unwrap();
        socket
    }

    /// Waits until the hub has registered `connections` live connections.
    pub async fn wait_for_connections(&self, connections: usize) {
        for _ in 0..100 {
            if self.hub.stats().await.unwrap().connections == connections {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("hub never reached {connections} connections");
    }
}

/// Next text frame from `socket`, parsed as JSON.
pub async fn next_event(socket: &mut Socket) -> Value {
    loop {
        let message = tokio::time::timeout(Duration::from_secs(2), socket.next())
            .await
            .expect("timed out waiting for an event")
            .expect("socket closed")
            .unwrap();
        if let Message::Text(text) = message {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

/// Asserts nothing arrives on `socket` for a short while.
pub async fn assert_silent(socket: &mut Socket) {
    let received = tokio::time::timeout(Duration::from_millis(300), socket.next()).await;
    assert!(received.is_err(), "unexpected frame: {received:?}");
}

pub async fn close(mut socket: Socket) {
    let _ = socket.send(Message::Close(None)).await;
}
