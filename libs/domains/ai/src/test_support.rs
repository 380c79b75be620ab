//! Local HTTP stub standing in for Azure endpoints in tests.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub path_and_query: String,
    pub api_key: Option<String>,
    pub subscription_key: Option<String>,
    pub content_type: Option<String>,
    pub body: Value,
    pub raw: Bytes,
}

struct StubState {
    status: StatusCode,
    reply: Value,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

pub struct StubServer {
    pub url: String,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

impl StubServer {
    /// Serve `reply` with `status` for every request on an ephemeral port.
    pub async fn start(status: StatusCode, reply: Value) -> Self {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let state = Arc::new(StubState {
            status,
            reply,
            seen: seen.clone(),
        });
        let app = Router::new().fallback(record).with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{}", addr),
            seen,
        }
    }

    pub async fn requests(&self) -> Vec<SeenRequest> {
        self.seen.lock().await.clone()
    }

    pub async fn single_request(&self) -> SeenRequest {
        let mut seen = self.requests().await;
        assert_eq!(seen.len(), 1, "expected exactly one request");
        seen.remove(0)
    }
}

async fn record(State(state): State<Arc<StubState>>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let raw = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    let header = |name: &str| {
        parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    state.seen.lock().await.push(SeenRequest {
        path_and_query: parts
            .uri
            .path_and_query()
            .map(|p| p.to_string())
            .unwrap_or_default(),
        api_key: header("api-key"),
        subscription_key: header("ocp-apim-subscription-key"),
        content_type: header("content-type"),
        body: serde_json::from_slice(&raw).unwrap_or(Value::Null),
        raw,
    });

    (state.status, Json(state.reply.clone())).into_response()
}

pub fn chat_reply(content: &str) -> Value {
    json!({
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
    })
}

pub fn embedding_reply(vector: &[f32]) -> Value {
    json!({
        "data": [{"index": 0, "object": "embedding", "embedding": vector}]
    })
}
