//! Shared fixtures: an in-process fake RunningHub server and a scripted
//! in-memory [`TaskApi`].

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::Json;
use axum::Router;
use photofx_core::submission::JobSubmission;
use photofx_core::{RegionConfig, TaskError, TaskId, TaskStatus};
use photofx_runninghub::TaskApi;
use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// Fake provider server
// ---------------------------------------------------------------------------

/// One request the fake provider received.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub host: Option<String>,
    pub body: Value,
}

#[derive(Default)]
struct ProviderState {
    requests: Vec<RecordedRequest>,
    /// Scripted replies per path. The last reply for a path repeats.
    replies: HashMap<String, VecDeque<(StatusCode, Value)>>,
}

/// A RunningHub stand-in bound to `127.0.0.1:0`.
#[derive(Clone)]
pub struct FakeProvider {
    pub base_url: String,
    state: Arc<Mutex<ProviderState>>,
}

impl FakeProvider {
    /// Start the server on an ephemeral port.
    pub async fn start() -> Self {
        let state = Arc::new(Mutex::new(ProviderState::default()));
        let app = Router::new()
            .fallback(handle)
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake provider");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    /// A region entry pointing at this server with the given `Host` header.
    pub fn region(&self, id: &str, host: &str) -> RegionConfig {
        RegionConfig::new(id, &self.base_url, host)
    }

    /// Queue a `200 OK` JSON reply for `path`.
    pub fn reply(&self, path: &str, body: Value) -> &Self {
        self.reply_with_status(path, StatusCode::OK, body)
    }

    /// Queue a reply with an explicit HTTP status for `path`.
    pub fn reply_with_status(&self, path: &str, status: StatusCode, body: Value) -> &Self {
        self.lock()
            .replies
            .entry(path.to_string())
            .or_default()
            .push_back((status, body));
        self
    }

    /// All requests received so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    /// Requests received for one path.
    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.lock()
            .requests
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ProviderState> {
        self.state.lock().expect("provider state poisoned")
    }
}

async fn handle(
    State(state): State<Arc<Mutex<ProviderState>>>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let path = uri.path().to_string();
    let host = headers
        .get(axum::http::header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = serde_json::from_slice(&body).unwrap_or(Value::Null);

    let mut state = state.lock().expect("provider state poisoned");
    state.requests.push(RecordedRequest {
        path: path.clone(),
        host,
        body,
    });

    let Some(queue) = state.replies.get_mut(&path) else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"code": 404, "msg": "no such route"})),
        );
    };
    let reply = if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    };
    match reply {
        Some((status, body)) => (status, Json(body)),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"code": 404, "msg": "no scripted reply"})),
        ),
    }
}

/// `{"code": 0, "msg": "success", "data": data}`.
pub fn ok(data: Value) -> Value {
    json!({"code": 0, "msg": "success", "data": data})
}

/// A non-zero provider envelope.
pub fn provider_error(code: i64, msg: &str) -> Value {
    json!({"code": code, "msg": msg, "data": null})
}

// ---------------------------------------------------------------------------
// Scripted TaskApi
// ---------------------------------------------------------------------------

/// In-memory [`TaskApi`] that replays a status script.
///
/// The last scripted status repeats once the script runs out.
pub struct ScriptedApi {
    region: RegionConfig,
    statuses: Mutex<VecDeque<Result<TaskStatus, TaskError>>>,
    result: Value,
    cancel_reply: Result<bool, TaskError>,
    failure_reason: Option<String>,
    pub status_calls: AtomicUsize,
    pub result_calls: AtomicUsize,
    pub cancel_calls: AtomicUsize,
}

impl ScriptedApi {
    pub fn new(statuses: Vec<Result<TaskStatus, TaskError>>) -> Self {
        Self {
            region: RegionConfig::new("hongkong", "https://www.runninghub.ai", "www.runninghub.ai"),
            statuses: Mutex::new(statuses.into()),
            result: json!(["/outputs/result.png"]),
            cancel_reply: Ok(true),
            failure_reason: None,
            status_calls: AtomicUsize::new(0),
            result_calls: AtomicUsize::new(0),
            cancel_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_result(mut self, result: Value) -> Self {
        self.result = result;
        self
    }

    pub fn with_cancel_reply(mut self, reply: Result<bool, TaskError>) -> Self {
        self.cancel_reply = reply;
        self
    }

    pub fn with_failure_reason(mut self, reason: &str) -> Self {
        self.failure_reason = Some(reason.to_string());
        self
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn result_calls(&self) -> usize {
        self.result_calls.load(Ordering::SeqCst)
    }

    pub fn cancel_calls(&self) -> usize {
        self.cancel_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TaskApi for ScriptedApi {
    fn region(&self) -> &RegionConfig {
        &self.region
    }

    async fn submit(&self, _submission: &JobSubmission) -> Result<TaskId, TaskError> {
        Ok(TaskId::new("1910246754753896450"))
    }

    async fn get_status(&self, _task_id: &TaskId) -> Result<TaskStatus, TaskError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let mut script = self.statuses.lock().expect("script poisoned");
        let next = if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().cloned()
        };
        next.unwrap_or(Ok(TaskStatus::Running))
    }

    async fn get_result(&self, _task_id: &TaskId) -> Result<Value, TaskError> {
        self.result_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.result.clone())
    }

    async fn cancel(&self, _task_id: &TaskId) -> Result<bool, TaskError> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        self.cancel_reply.clone()
    }

    async fn failure_reason(&self, _task_id: &TaskId) -> Option<String> {
        self.failure_reason.clone()
    }
}
