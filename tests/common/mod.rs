//! Shared fixtures: a deterministic keyword embedder and an axum server
//! that speaks the Ollama and OpenAI embedding protocols.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

use ragkb_core::embedding::Embedder;

pub const VOCABULARY: [&str; 5] = ["rust", "python", "kubernetes", "cargo", "docker"];

/// One dimension per vocabulary word (occurrence count) plus a small bias so
/// no vector is all-zero.
pub fn keyword_vector(text: &str) -> Vec<f32> {
    let lower = text.to_lowercase();
    let mut v: Vec<f32> = VOCABULARY
        .iter()
        .map(|word| lower.matches(word).count() as f32)
        .collect();
    v.push(0.1);
    v
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Ok,
    Fail,
    /// Return one vector fewer than requested.
    Short,
    /// Return vectors carrying an infinite component.
    NonFinite,
}

pub struct KeywordEmbedder {
    pub mode: Mode,
    pub calls: AtomicUsize,
}

impl KeywordEmbedder {
    pub fn new(mode: Mode) -> Arc<Self> {
        Arc::new(Self {
            mode,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    fn name(&self) -> &str {
        "keyword"
    }

    async fn embed(&self, _model: &str, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.mode {
            Mode::Ok => Ok(texts.iter().map(|t| keyword_vector(t)).collect()),
            Mode::Fail => anyhow::bail!("model unavailable"),
            Mode::Short => Ok(texts.iter().skip(1).map(|t| keyword_vector(t)).collect()),
            Mode::NonFinite => Ok(texts
                .iter()
                .map(|t| {
                    let mut v = keyword_vector(t);
                    v[0] = f32::INFINITY;
                    v
                })
                .collect()),
        }
    }
}

// ============ Mock HTTP server ============

#[derive(Clone, Default)]
pub struct MockState {
    pub requests: Arc<AtomicUsize>,
    pub flaky_failures_left: Arc<AtomicUsize>,
}

fn inputs(body: &Value) -> Vec<String> {
    body.get("input")
        .and_then(|i| i.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|i| i.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

async fn ollama_embed(State(state): State<MockState>, Json(body): Json<Value>) -> Json<Value> {
    state.requests.fetch_add(1, Ordering::SeqCst);
    let embeddings: Vec<Vec<f32>> = inputs(&body).iter().map(|t| keyword_vector(t)).collect();
    Json(json!({ "model": body["model"], "embeddings": embeddings }))
}

/// Answers in reverse order so clients must sort by `index`.
async fn openai_embed(State(state): State<MockState>, Json(body): Json<Value>) -> Json<Value> {
    state.requests.fetch_add(1, Ordering::SeqCst);
    let data: Vec<Value> = inputs(&body)
        .iter()
        .enumerate()
        .rev()
        .map(|(index, t)| json!({ "object": "embedding", "index": index, "embedding": keyword_vector(t) }))
        .collect();
    Json(json!({ "object": "list", "data": data }))
}

async fn rejecting(State(state): State<MockState>) -> (StatusCode, &'static str) {
    state.requests.fetch_add(1, Ordering::SeqCst);
    (StatusCode::BAD_REQUEST, "model \"missing\" not found")
}

async fn flaky(
    State(state): State<MockState>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, (StatusCode, &'static str)> {
    state.requests.fetch_add(1, Ordering::SeqCst);
    let left = state.flaky_failures_left.load(Ordering::SeqCst);
    if left > 0 {
        state.flaky_failures_left.store(left - 1, Ordering::SeqCst);
        return Err((StatusCode::SERVICE_UNAVAILABLE, "warming up"));
    }
    Ok(ollama_embed(State(state), Json(body)).await)
}

/// Routes:
/// - `/api/embed`, `/v1/embeddings`: healthy Ollama and OpenAI endpoints
/// - `/reject/api/embed`: always 400
/// - `/flaky/api/embed`: 503 while `flaky_failures_left > 0`, then healthy
pub async fn spawn_mock_server(state: MockState) -> SocketAddr {
    let app = Router::new()
        .route("/api/embed", post(ollama_embed))
        .route("/v1/embeddings", post(openai_embed))
        .route("/reject/api/embed", post(rejecting))
        .route("/flaky/api/embed", post(flaky))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Run the mock server on its own runtime thread, for blocking tests.
pub fn spawn_mock_server_thread() -> SocketAddr {
    let (tx, rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async move {
            let addr = spawn_mock_server(MockState::default()).await;
            tx.send(addr).unwrap();
            std::future::pending::<()>().await;
        });
    });
    rx.recv().unwrap()
}
