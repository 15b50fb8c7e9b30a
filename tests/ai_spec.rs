use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use chrono::{NaiveDate, NaiveTime};
use echo_core::ai::*;
use echo_core::models::*;
use serde_json::{json, Value};
use uuid::Uuid;

/// What the mock vendor saw on its last request.
#[derive(Debug, Clone, Default)]
struct Captured {
    headers: HashMap<String, String>,
    query: HashMap<String, String>,
    path: String,
    body: Value,
}

#[derive(Clone)]
struct MockVendor {
    status: StatusCode,
    body: Value,
    hits: Arc<AtomicUsize>,
    last: Arc<Mutex<Option<Captured>>>,
}

impl MockVendor {
    fn new(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            body,
            hits: Arc::new(AtomicUsize::new(0)),
            last: Arc::new(Mutex::new(None)),
        }
    }

    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    fn last(&self) -> Captured {
        self.last.lock().unwrap().clone().expect("no request captured")
    }

    fn record(&self, headers: &HeaderMap, query: HashMap<String, String>, path: String, body: Value) {
        self.hits.fetch_add(1, Ordering::SeqCst);
        let headers = headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or_default().to_string()))
            .collect();
        *self.last.lock().unwrap() = Some(Captured {
            headers,
            query,
            path,
            body,
        });
    }
}

async fn claude_messages(
    State(mock): State<MockVendor>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    mock.record(&headers, HashMap::new(), "messages".to_string(), body);
    (mock.status, Json(mock.body.clone()))
}

async fn gemini_generate(
    State(mock): State<MockVendor>,
    Path(action): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    mock.record(&headers, query, action, body);
    (mock.status, Json(mock.body.clone()))
}

/// Start a mock vendor on a random port and return its base URL.
async fn serve(mock: MockVendor) -> String {
    let app = Router::new()
        .route("/v1/messages", post(claude_messages))
        .route("/v1beta/models/{action}", post(gemini_generate))
        .with_state(mock);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn claude_client(mock: MockVendor, key: Option<&str>) -> AssistantClient {
    let base = serve(mock).await;
    let keys = Arc::new(ApiKeyManager::new());
    if let Some(key) = key {
        keys.save_api_key(Vendor::Claude, key);
    }
    let profile = VendorProfile::claude().with_base_url(format!("{base}/v1"));
    AssistantClient::new(profile, keys).unwrap()
}

async fn gemini_client(mock: MockVendor, key: Option<&str>) -> AssistantClient {
    let base = serve(mock).await;
    let keys = Arc::new(ApiKeyManager::new());
    if let Some(key) = key {
        keys.save_api_key(Vendor::Gemini, key);
    }
    let profile = VendorProfile::gemini().with_base_url(format!("{base}/v1beta"));
    AssistantClient::new(profile, keys).unwrap()
}

fn claude_text(text: &str) -> Value {
    json!({
        "id": "msg_01",
        "type": "message",
        "role": "assistant",
        "model": CLAUDE_MODEL,
        "content": [{ "type": "text", "text": text }]
    })
}

fn gemini_text(text: &str) -> Value {
    json!({
        "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }]
    })
}

fn task(title: &str, priority: TaskPriority, done: bool) -> Task {
    let mut task = Task::new(Uuid::new_v4(), title, "details", priority);
    task.is_completed = done;
    task
}

fn mood(level: MoodLevel, energy: EnergyLevel, d: u32) -> MoodEnergyEntry {
    MoodEnergyEntry::new(
        level,
        energy,
        "",
        NaiveDate::from_ymd_opt(2025, 4, d).unwrap(),
        NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
    )
}

mod send_message {
    use super::*;

    #[tokio::test]
    async fn fails_without_a_key_before_any_request() {
        let mock = MockVendor::new(StatusCode::OK, claude_text("unused"));
        let client = claude_client(mock.clone(), None).await;

        let err = client.send_message("Hello", &[]).await.unwrap_err();

        assert!(matches!(err, AiError::MissingApiKey(Vendor::Claude)));
        assert_eq!(mock.hits(), 0);
    }

    #[tokio::test]
    async fn sends_claude_headers_and_task_context() {
        let mock = MockVendor::new(StatusCode::OK, claude_text("Start with the outline."));
        let client = claude_client(mock.clone(), Some("sk-test")).await;
        let tasks = [task("Draft", TaskPriority::High, false), task("Research", TaskPriority::Low, true)];

        let reply = client.send_message("What next?", &tasks).await.unwrap();

        assert_eq!(reply, Reply::Content("Start with the outline.".to_string()));
        let seen = mock.last();
        assert_eq!(seen.headers.get("x-api-key").map(String::as_str), Some("sk-test"));
        assert_eq!(seen.headers.get("anthropic-version").map(String::as_str), Some(ANTHROPIC_VERSION));
        assert_eq!(seen.body["model"], CLAUDE_MODEL);
        assert_eq!(seen.body["max_tokens"], 1024);
        assert_eq!(seen.body["messages"][0]["role"], "user");
        assert_eq!(seen.body["messages"][0]["content"], "What next?");

        let system = seen.body["system"].as_str().unwrap();
        assert!(system.contains("- Draft (Priority: HIGH): details"));
        assert!(system.contains("Recently completed tasks:\n- Research"));
    }

    #[tokio::test]
    async fn passes_the_gemini_key_as_a_query_parameter() {
        let mock = MockVendor::new(StatusCode::OK, gemini_text("Take a short break."));
        let client = gemini_client(mock.clone(), Some("g-key")).await;

        let reply = client.send_message("I'm stuck", &[]).await.unwrap();

        assert_eq!(reply.text(), "Take a short break.");
        let seen = mock.last();
        assert_eq!(seen.path, "gemini-2.0-flash:generateContent");
        assert_eq!(seen.query.get("key").map(String::as_str), Some("g-key"));
        assert!(!seen.headers.contains_key("x-api-key"));

        let parts = seen.body["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 2);
        assert!(parts[0]["text"].as_str().unwrap().starts_with("You are Echo"));
        assert_eq!(parts[1]["text"], "I'm stuck");
    }

    #[tokio::test]
    async fn reports_auth_failures() {
        let mock = MockVendor::new(StatusCode::UNAUTHORIZED, json!({ "error": "bad key" }));
        let client = claude_client(mock, Some("sk-wrong")).await;

        let reply = client.send_message("Hello", &[]).await.unwrap();

        assert_eq!(reply.degraded_reason(), Some(DegradedReason::AuthFailed));
        assert!(reply.text().contains("invalid API key or network issues"));
        assert!(reply.text().contains("Claude AI service"));
    }

    #[tokio::test]
    async fn reports_rate_limiting() {
        let mock = MockVendor::new(StatusCode::TOO_MANY_REQUESTS, json!({}));
        let client = gemini_client(mock, Some("g-key")).await;

        let reply = client.send_message("Hello", &[]).await.unwrap();

        assert_eq!(reply.degraded_reason(), Some(DegradedReason::RateLimited));
        assert!(reply.text().contains("Gemini AI service"));
    }

    #[tokio::test]
    async fn reports_server_errors_with_their_status() {
        let mock = MockVendor::new(StatusCode::INTERNAL_SERVER_ERROR, json!({}));
        let client = claude_client(mock, Some("sk-test")).await;

        let reply = client.send_message("Hello", &[]).await.unwrap();

        assert_eq!(reply.degraded_reason(), Some(DegradedReason::ServiceError(500)));
    }

    #[tokio::test]
    async fn reports_empty_content() {
        let mock = MockVendor::new(StatusCode::OK, json!({ "content": [] }));
        let client = claude_client(mock, Some("sk-test")).await;

        let reply = client.send_message("Hello", &[]).await.unwrap();

        assert_eq!(reply.degraded_reason(), Some(DegradedReason::EmptyResponse));
        assert!(reply.text().starts_with("I'm sorry, but I couldn't generate a response"));
    }

    #[tokio::test]
    async fn reports_undecodable_bodies() {
        let mock = MockVendor::new(StatusCode::OK, json!({ "candidates": "nope" }));
        let client = gemini_client(mock, Some("g-key")).await;

        let reply = client.send_message("Hello", &[]).await.unwrap();

        assert_eq!(reply.degraded_reason(), Some(DegradedReason::InvalidResponse));
    }

    #[tokio::test]
    async fn reports_unreachable_vendors() {
        let keys = Arc::new(ApiKeyManager::new());
        keys.save_api_key(Vendor::Claude, "sk-test");
        let profile = VendorProfile::claude().with_base_url("http://127.0.0.1:1/v1");
        let client = AssistantClient::new(profile, keys).unwrap();

        let reply = client.send_message("Hello", &[]).await.unwrap();

        assert_eq!(reply.degraded_reason(), Some(DegradedReason::NetworkFailed));
    }
}

mod greeting {
    use super::*;

    #[tokio::test]
    async fn uses_the_no_tasks_literal_without_tasks() {
        let mock = MockVendor::new(StatusCode::OK, claude_text("unused"));
        let client = claude_client(mock.clone(), None).await;

        let greeting = client.generate_initial_greeting(&[]);

        assert_eq!(
            greeting,
            "Hello! I'm Echo (powered by Claude), your AI assistant. I'm here to help you manage your tasks and boost your productivity. How can I assist you today?"
        );
        assert_eq!(mock.hits(), 0);
    }

    #[tokio::test]
    async fn mentions_a_high_priority_task() {
        let mock = MockVendor::new(StatusCode::OK, gemini_text("unused"));
        let client = gemini_client(mock, None).await;

        let greeting = client.generate_initial_greeting(&[task("Draft", TaskPriority::High, false)]);

        assert!(greeting.contains("\"Draft\""));
        assert!(greeting.contains("powered by Gemini"));
    }
}

mod reflection {
    use super::*;

    #[tokio::test]
    async fn requires_a_key() {
        let mock = MockVendor::new(StatusCode::OK, claude_text("unused"));
        let client = claude_client(mock.clone(), None).await;

        let err = client.generate_reflection(&[]).await.unwrap_err();

        assert!(matches!(err, AiError::MissingApiKey(_)));
        assert_eq!(mock.hits(), 0);
    }

    #[tokio::test]
    async fn answers_locally_without_entries() {
        let mock = MockVendor::new(StatusCode::OK, claude_text("unused"));
        let client = claude_client(mock.clone(), Some("sk-test")).await;

        let reply = client.generate_reflection(&[]).await.unwrap();

        assert_eq!(reply.text(), prompt::NO_MOOD_DATA);
        assert_eq!(mock.hits(), 0);
    }

    #[tokio::test]
    async fn sends_entries_and_the_most_common_mood() {
        let mock = MockVendor::new(StatusCode::OK, claude_text("You are doing well."));
        let client = claude_client(mock.clone(), Some("sk-test")).await;
        let entries = [
            mood(MoodLevel::Good, EnergyLevel::High, 1),
            mood(MoodLevel::Good, EnergyLevel::Medium, 2),
            mood(MoodLevel::Bad, EnergyLevel::Medium, 3),
        ];

        let reply = client.generate_reflection(&entries).await.unwrap();

        assert_eq!(reply.text(), "You are doing well.");
        let seen = mock.last();
        assert_eq!(seen.body["messages"][0]["content"], prompt::REFLECTION_REQUEST);
        let system = seen.body["system"].as_str().unwrap();
        assert!(system.contains("Entry 3:"));
        assert!(system.contains("- Most common mood: Good"));
        assert_eq!(prompt::most_common_mood(&entries), Some(MoodLevel::Good));
        assert_eq!(prompt::most_common_energy(&entries), Some(EnergyLevel::Medium));
    }

    #[tokio::test]
    async fn falls_back_when_the_vendor_fails() {
        let mock = MockVendor::new(StatusCode::SERVICE_UNAVAILABLE, json!({}));
        let client = gemini_client(mock, Some("g-key")).await;

        let reply = client
            .generate_reflection(&[mood(MoodLevel::Neutral, EnergyLevel::Low, 4)])
            .await
            .unwrap();

        assert_eq!(reply.degraded_reason(), Some(DegradedReason::ServiceError(503)));
        assert!(reply.text().starts_with("I encountered an error while trying to generate a reflection"));
    }
}
