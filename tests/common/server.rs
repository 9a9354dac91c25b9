//! Fake generative service
//!
//! Spawns an axum server on a random port that speaks just enough of the
//! `generateContent` protocol for the client. Every request is recorded;
//! replies are scripted per model and fall back to a successful default.

#![allow(dead_code)]

use super::constants::*;
use super::fixtures::{concept_response, image_response, speech_response, test_pcm, test_png};
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use diffusong::genai::{
    GeminiClient, DEFAULT_CONCEPT_MODEL, DEFAULT_IMAGE_MODEL, DEFAULT_SPEECH_MODEL,
};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

/// A request as received by the fake service.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub model: String,
    pub api_key: Option<String>,
    pub body: Value,
}

impl RecordedRequest {
    /// Text of the first user part.
    pub fn prompt_text(&self) -> &str {
        self.body["contents"][0]["parts"][0]["text"]
            .as_str()
            .unwrap_or_default()
    }

    pub fn generation_config(&self) -> &Value {
        &self.body["generationConfig"]
    }
}

/// A scripted reply.
#[derive(Debug, Clone)]
pub struct FakeReply {
    pub status: u16,
    pub body: String,
    pub delay: Option<Duration>,
}

impl FakeReply {
    pub fn json(body: Value) -> Self {
        Self::raw(200, &body.to_string())
    }

    pub fn error(status: u16, message: &str) -> Self {
        let body = json!({
            "error": { "code": status, "message": message, "status": "ERROR" }
        });
        Self::raw(status, &body.to_string())
    }

    pub fn raw(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: None,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[derive(Default)]
struct FakeState {
    requests: Vec<RecordedRequest>,
    replies: HashMap<String, VecDeque<FakeReply>>,
}

type SharedState = Arc<Mutex<FakeState>>;

pub struct FakeGemini {
    pub base_url: String,
    state: SharedState,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl FakeGemini {
    pub async fn spawn() -> Self {
        let state = SharedState::default();

        let app = Router::new()
            .route("/v1beta/models", get(list_models))
            .route("/v1beta/models/{call}", post(generate_content))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().expect("Failed to get local address");

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
            _shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Queue `reply` for the next call to `model`.
    pub fn reply(&self, model: &str, reply: FakeReply) {
        self.state
            .lock()
            .unwrap()
            .replies
            .entry(model.to_string())
            .or_default()
            .push_back(reply);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn requests_for(&self, model: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.model == model)
            .collect()
    }

    /// A client with the accepted key and the default models.
    pub fn client(&self) -> GeminiClient {
        GeminiClient::new(self.base_url.clone(), Some(TEST_API_KEY.to_string()), 5)
            .expect("Failed to create client")
    }

    pub fn unauthenticated_client(&self) -> GeminiClient {
        GeminiClient::new(self.base_url.clone(), None, 5).expect("Failed to create client")
    }
}

impl Drop for FakeGemini {
    fn drop(&mut self) {
        // Send shutdown signal
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

fn api_key(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-goog-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn default_reply(model: &str) -> FakeReply {
    match model {
        DEFAULT_CONCEPT_MODEL => FakeReply::json(concept_response()),
        DEFAULT_IMAGE_MODEL => FakeReply::json(image_response(&test_png())),
        DEFAULT_SPEECH_MODEL => FakeReply::json(speech_response(&test_pcm())),
        other => FakeReply::error(404, &format!("models/{} is not found", other)),
    }
}

fn into_response(reply: FakeReply) -> impl IntoResponse {
    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, [(header::CONTENT_TYPE, "application/json")], reply.body)
}

async fn list_models(headers: HeaderMap) -> impl IntoResponse {
    if api_key(&headers).as_deref() != Some(TEST_API_KEY) {
        return into_response(FakeReply::error(401, INVALID_KEY_MESSAGE));
    }
    into_response(FakeReply::json(json!({ "models": [] })))
}

async fn generate_content(
    State(state): State<SharedState>,
    Path(call): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let Some((model, "generateContent")) = call.split_once(':') else {
        return into_response(FakeReply::error(404, "Unknown method"));
    };
    let api_key = api_key(&headers);

    let reply = {
        let mut state = state.lock().unwrap();
        state.requests.push(RecordedRequest {
            model: model.to_string(),
            api_key: api_key.clone(),
            body,
        });
        if api_key.as_deref() != Some(TEST_API_KEY) {
            FakeReply::error(401, INVALID_KEY_MESSAGE)
        } else {
            state
                .replies
                .get_mut(model)
                .and_then(VecDeque::pop_front)
                .unwrap_or_else(|| default_reply(model))
        }
    };

    if let Some(delay) = reply.delay {
        tokio::time::sleep(delay).await;
    }
    into_response(reply)
}
