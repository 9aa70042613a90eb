//! In-process scoring service for remote-strategy tests.

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use crossrank::reranker::wire::{PairsRequest, ScoreResponse, TensorsRequest};
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// How the service answers scoring requests.
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Pairs: share of query words found in the document.
    /// Tensors: share of distinct ids repeated within the real span.
    /// Both map into `[0.1, 0.9]`.
    Overlap,
    /// Same scores for every request, regardless of input size.
    Fixed(Vec<f64>),
    /// Non-success status with a plain-text body.
    Status(u16, &'static str),
    /// 200 with this exact JSON body.
    Raw(&'static str),
    /// Sleeps, then answers like `Overlap`.
    Delay(Duration),
}

#[derive(Debug)]
struct MockState {
    behavior: Behavior,
    requests: Mutex<Vec<(String, serde_json::Value)>>,
    hits: AtomicUsize,
}

pub struct MockScoringService {
    pub addr: SocketAddr,
    state: Arc<MockState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    _server_handle: JoinHandle<()>,
}

impl MockScoringService {
    pub async fn start(behavior: Behavior) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock scoring service");
        let addr = listener.local_addr().expect("local addr");

        let state = Arc::new(MockState {
            behavior,
            requests: Mutex::new(Vec::new()),
            hits: AtomicUsize::new(0),
        });

        let app = Router::new()
            .route("/", get(root))
            .route("/rerank", post(rerank))
            .route("/inference", post(inference))
            .with_state(Arc::clone(&state));

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let server_handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
            _server_handle: server_handle,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Scoring requests received so far, as `(path, body)`.
    pub fn requests(&self) -> Vec<(String, serde_json::Value)> {
        self.state.requests.lock().clone()
    }

    /// Number of scoring requests received (health probes excluded).
    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    pub fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// A base URL nothing listens on.
pub async fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{addr}")
}

async fn root() -> &'static str {
    "ok"
}

async fn rerank(
    State(state): State<Arc<MockState>>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    respond(&state, "/rerank", body, |body| {
        let request: PairsRequest = serde_json::from_value(body).ok()?;
        Some(
            request
                .pairs
                .iter()
                .map(|[query, document]| word_overlap(query, document))
                .collect(),
        )
    })
    .await
}

async fn inference(
    State(state): State<Arc<MockState>>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    respond(&state, "/inference", body, |body| {
        let request: TensorsRequest = serde_json::from_value(body).ok()?;
        Some(
            request
                .input_ids
                .iter()
                .zip(&request.attention_mask)
                .map(|(ids, mask)| repeated_ids(ids, mask))
                .collect(),
        )
    })
    .await
}

async fn respond<F>(state: &MockState, path: &str, body: serde_json::Value, overlap: F) -> Response
where
    F: FnOnce(serde_json::Value) -> Option<Vec<f64>>,
{
    state.hits.fetch_add(1, Ordering::SeqCst);
    state.requests.lock().push((path.to_string(), body.clone()));

    match &state.behavior {
        Behavior::Overlap => scored(overlap(body)),
        Behavior::Fixed(scores) => Json(ScoreResponse::scores(scores.clone())).into_response(),
        Behavior::Status(code, text) => (
            StatusCode::from_u16(*code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            *text,
        )
            .into_response(),
        Behavior::Raw(raw) => ([(header::CONTENT_TYPE, "application/json")], *raw).into_response(),
        Behavior::Delay(delay) => {
            tokio::time::sleep(*delay).await;
            scored(overlap(body))
        }
    }
}

fn scored(scores: Option<Vec<f64>>) -> Response {
    match scores {
        Some(scores) => Json(ScoreResponse::scores(scores)).into_response(),
        None => (
            StatusCode::BAD_REQUEST,
            Json(ScoreResponse::error("unrecognized request body")),
        )
            .into_response(),
    }
}

fn words(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn word_overlap(query: &str, document: &str) -> f64 {
    let query_words = words(query);
    if query_words.is_empty() {
        return 0.1;
    }
    let document_words = words(document);
    let shared = query_words.intersection(&document_words).count();
    0.1 + 0.8 * shared as f64 / query_words.len() as f64
}

fn repeated_ids(ids: &[i64], mask: &[i64]) -> f64 {
    let real = mask.iter().filter(|&&m| m == 1).count().min(ids.len());
    if real <= 2 {
        return 0.1;
    }
    let mut counts: HashMap<i64, usize> = HashMap::new();
    for &id in &ids[1..real - 1] {
        *counts.entry(id).or_default() += 1;
    }
    let repeated = counts.values().filter(|&&n| n > 1).count();
    0.1 + 0.8 * repeated as f64 / counts.len() as f64
}
