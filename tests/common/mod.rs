use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use uuid::Uuid;

use spendtrack::config::Config;
use spendtrack::realtime::{EventHub, RealtimeEvent, RealtimeHub};

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A running test server instance with a dedicated test database.
pub struct TestApp {
    pub addr: SocketAddr,
    pub pool: PgPool,
    pub client: Client,
    pub db_name: String,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn ws_url(&self, path: &str) -> String {
        format!("ws://{}{}", self.addr, path)
    }

    pub async fn register(&self, email: &str, password: &str, name: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/api/auth/register"))
            .json(&json!({ "name": name, "email": email, "password": password }))
            .send()
            .await
            .expect("register request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn login(&self, email: &str, password: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("login request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Register a fresh user and return their bearer token.
    pub async fn register_user(&self, email: &str) -> String {
        let (body, status) = self.register(email, "password123", "Test User").await;
        assert_eq!(status, StatusCode::OK, "register failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }

    /// Insert an admin directly (registration only creates `user` roles),
    /// log them in and return the bearer token.
    pub async fn create_admin(&self, email: &str, password: &str) -> String {
        let pw_hash = spendtrack::auth::password::hash(password).expect("hash failed");
        sqlx::query(
            "INSERT INTO users (name, email, password_hash, role) VALUES ($1, $2, $3, 'admin')",
        )
        .bind("Admin")
        .bind(email)
        .bind(&pw_hash)
        .execute(&self.pool)
        .await
        .expect("insert admin failed");

        let (body, status) = self.login(email, password).await;
        assert_eq!(status, StatusCode::OK, "admin login failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }

    /// Create a free-mode expense, return the response body.
    pub async fn create_expense(&self, token: &str, amount: f64, reason: &str) -> Value {
        let (body, status) = self
            .post_auth(
                "/api/expenses",
                token,
                &json!({ "amount": amount, "reason": reason }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "create expense failed: {body}");
        body
    }

    /// Create a budget-mode expense against a budget, return the response body.
    pub async fn create_budget_expense(
        &self,
        token: &str,
        amount: f64,
        reason: &str,
        budget_id: &str,
    ) -> Value {
        let (body, status) = self
            .post_auth(
                "/api/expenses",
                token,
                &json!({
                    "amount": amount,
                    "reason": reason,
                    "trackingMode": "budget",
                    "budgetId": budget_id,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "create budget expense failed: {body}");
        body
    }

    /// Create a budget, return the budget JSON.
    pub async fn create_budget(&self, token: &str, total_amount: f64) -> Value {
        let (body, status) = self
            .post_auth("/api/budgets", token, &json!({ "totalAmount": total_amount }))
            .await;
        assert_eq!(status, StatusCode::OK, "create budget failed: {body}");
        body["budget"].clone()
    }

    pub async fn get_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn post_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("post request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn put_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .put(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("put request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn delete_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("delete request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Open a websocket session authenticated via the `token` query parameter.
    pub async fn ws_connect(&self, token: &str) -> WsStream {
        let url = self.ws_url(&format!("/api/socket?token={token}"));
        let (stream, _) = connect_async(url).await.expect("websocket connect failed");
        stream
    }

    /// Open a websocket session authenticated via the Authorization header.
    pub async fn ws_connect_bearer(&self, token: &str) -> WsStream {
        let mut request = self
            .ws_url("/api/socket")
            .into_client_request()
            .expect("invalid websocket request");
        request.headers_mut().insert(
            "Authorization",
            format!("Bearer {token}").parse().expect("invalid header"),
        );
        let (stream, _) = connect_async(request)
            .await
            .expect("websocket connect failed");
        stream
    }
}

/// Next JSON text frame from the socket; panics if nothing arrives in time.
pub async fn ws_next_json(ws: &mut WsStream) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for websocket event")
            .expect("websocket closed")
            .expect("websocket error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(&text).expect("invalid event json");
        }
    }
}

/// Next JSON text frame if one arrives within `wait`, None otherwise.
pub async fn ws_try_next(ws: &mut WsStream, wait: Duration) -> Option<Value> {
    match tokio::time::timeout(wait, ws.next()).await {
        Ok(Some(Ok(Message::Text(text)))) => {
            Some(serde_json::from_str(&text).expect("invalid event json"))
        }
        _ => None,
    }
}

/// Hub stand-in that records every publish instead of fanning out.
pub struct RecordingHub {
    tx: broadcast::Sender<RealtimeEvent>,
    pub published: Mutex<Vec<(Uuid, RealtimeEvent)>>,
}

impl RecordingHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self {
            tx,
            published: Mutex::new(Vec::new()),
        }
    }
}

impl EventHub for RecordingHub {
    fn subscribe(&self, _user_id: Uuid) -> broadcast::Receiver<RealtimeEvent> {
        self.tx.subscribe()
    }

    fn publish(&self, user_id: Uuid, event: RealtimeEvent) -> usize {
        self.published.lock().unwrap().push((user_id, event));
        0
    }
}

/// Spawn a test app with a fresh temporary database.
pub async fn spawn_app() -> TestApp {
    spawn_app_with_hub(Arc::new(RealtimeHub::new())).await
}

/// Same as `spawn_app` but with a caller-provided event hub.
pub async fn spawn_app_with_hub(events: Arc<dyn EventHub>) -> TestApp {
    let _ = dotenvy::dotenv();

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    // Create a unique test database
    let db_name = format!(
        "spendtrack_test_{}",
        Uuid::now_v7().to_string().replace('-', "")
    );

    // Connect to default postgres DB to create test DB
    let admin_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/postgres"))
        .unwrap_or_else(|| base_url.clone());

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url)
        .await
        .expect("Failed to connect to postgres for test DB creation");

    sqlx::query(&format!("CREATE DATABASE \"{db_name}\""))
        .execute(&admin_pool)
        .await
        .expect("Failed to create test database");

    admin_pool.close().await;

    // Connect to test DB and run migrations
    let test_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/{db_name}"))
        .unwrap_or_else(|| base_url.clone());

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&test_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations on test database");

    let config = Config {
        database_url: test_url,
        jwt_secret: "test-jwt-secret-that-is-long-enough".to_string(),
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        max_body_size: 1_048_576,
        token_ttl_hours: 24,
        log_level: "warn".to_string(),
    };

    let app = spendtrack::build_app(pool.clone(), config, events);

    // Bind to random port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    // Spawn server in background
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        addr,
        pool,
        client,
        db_name,
    }
}

/// Drop the test database after tests complete.
pub async fn cleanup(app: TestApp) {
    let db_name = app.db_name.clone();
    app.pool.close().await;

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");
    let admin_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/postgres"))
        .unwrap_or_else(|| base_url.clone());

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url)
        .await
        .expect("Failed to connect for cleanup");

    let _ = sqlx::query(&format!("DROP DATABASE IF EXISTS \"{db_name}\" WITH (FORCE)"))
        .execute(&admin_pool)
        .await;

    admin_pool.close().await;
}
