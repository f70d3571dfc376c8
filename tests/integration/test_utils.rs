//! Shared test utilities for integration tests
//!
//! Provides a scripted in-memory transport and environment isolation for
//! config tests so suites do not depend on the host machine.

use async_trait::async_trait;
use jikan_relay::api::JikanClient;
use jikan_relay::error::ApiError;
use jikan_relay::queue::RequestQueue;
use jikan_relay::retry::{RetryExecutor, RetryPolicy};
use jikan_relay::transport::{ApiRequest, Transport, TransportResponse};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::{sleep, Instant};

/// One request as the transport saw it.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub request: ApiRequest,
    pub at: Instant,
}

/// Transport that replays canned responses in order.
///
/// When the script runs dry the fallback response (if any) is repeated;
/// without a fallback the call fails with a transport error.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<TransportResponse>>,
    fallback: Option<TransportResponse>,
    latency: Duration,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: None,
            latency: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue one response.
    pub fn respond(self, status: u16, body: Value) -> Self {
        self.script
            .lock()
            .push_back(TransportResponse::new(status, body.to_string()));
        self
    }

    /// Response used once the script is exhausted.
    pub fn always(mut self, status: u16, body: Value) -> Self {
        self.fallback = Some(TransportResponse::new(status, body.to_string()));
        self
    }

    /// Simulated network time per request.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn dispatch_times(&self) -> Vec<Instant> {
        self.calls.lock().iter().map(|c| c.at).collect()
    }

    /// `q` parameter of each search, in the order they reached the network.
    pub fn search_terms(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| c.request.query_value("q").map(str::to_string))
            .collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, request: &ApiRequest) -> Result<TransportResponse, ApiError> {
        self.calls.lock().push(RecordedCall {
            request: request.clone(),
            at: Instant::now(),
        });

        // Consumed on arrival, so an abandoned request still uses up its response.
        let next = self.script.lock().pop_front();
        let response = next
            .or_else(|| self.fallback.clone())
            .ok_or_else(|| ApiError::Transport("script exhausted".to_string()));

        if !self.latency.is_zero() {
            sleep(self.latency).await;
        }
        response
    }
}

/// Client over `transport` with default retry policy and the given pacing.
pub fn client_with(transport: Arc<ScriptedTransport>, min_interval: Duration) -> JikanClient {
    JikanClient::new(
        transport,
        RequestQueue::with_min_interval(min_interval),
        RetryExecutor::new(RetryPolicy::default()),
    )
}

/// Client with the 2500ms production pacing.
pub fn paced_client(transport: Arc<ScriptedTransport>) -> JikanClient {
    client_with(transport, Duration::from_millis(2500))
}

pub fn anime(id: u64, title: &str) -> Value {
    json!({
        "mal_id": id,
        "url": format!("https://myanimelist.net/anime/{}", id),
        "title": title,
        "type": "TV",
        "episodes": 12,
        "score": 7.5,
        "images": {
            "jpg": { "image_url": format!("https://cdn.myanimelist.net/images/anime/{}.jpg", id) }
        }
    })
}

/// A search page with `titles` as results.
pub fn search_page(titles: &[&str], current_page: u32, last_page: u32, total: u32) -> Value {
    let data: Vec<Value> = titles
        .iter()
        .enumerate()
        .map(|(i, t)| anime(i as u64 + 1, t))
        .collect();
    json!({
        "data": data,
        "pagination": {
            "last_visible_page": last_page,
            "has_next_page": current_page < last_page,
            "current_page": current_page,
            "items": { "count": titles.len(), "total": total, "per_page": 25 }
        }
    })
}

pub fn rate_limited() -> Value {
    json!({
        "status": 429,
        "type": "RateLimitException",
        "message": "You are being rate-limited."
    })
}

pub fn not_found() -> Value {
    json!({
        "status": 404,
        "type": "BadResponseException",
        "message": "Resource does not exist"
    })
}

static ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

const ISOLATED_VARS: &[&str] = &["HOME", "XDG_CONFIG_HOME", "JIKAN_RELAY_ENV"];

/// Environment variable state to restore after test
struct EnvState {
    saved: Vec<(String, Option<String>)>,
}

impl EnvState {
    fn capture() -> Self {
        let mut names: Vec<String> = ISOLATED_VARS.iter().map(|s| s.to_string()).collect();
        names.extend(
            std::env::vars()
                .map(|(k, _)| k)
                .filter(|k| k.starts_with("JIKAN_RELAY__")),
        );
        Self {
            saved: names
                .into_iter()
                .map(|name| {
                    let value = std::env::var(&name).ok();
                    (name, value)
                })
                .collect(),
        }
    }

    fn restore(self) {
        for (k, _) in std::env::vars() {
            if k.starts_with("JIKAN_RELAY__") {
                std::env::remove_var(k);
            }
        }
        for (name, value) in self.saved {
            match value {
                Some(v) => std::env::set_var(&name, v),
                None => std::env::remove_var(&name),
            }
        }
    }
}

/// Run `f` with HOME and XDG_CONFIG_HOME pointed into `test_dir` and no
/// `JIKAN_RELAY__*` overrides set. Serialized across tests.
pub fn with_isolated_env<F, R>(test_dir: &TempDir, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let env_state = EnvState::capture();

    let config_home = test_dir.path().join("xdg-config");
    let home = test_dir.path().join("home");
    std::fs::create_dir_all(&config_home).unwrap();
    std::fs::create_dir_all(&home).unwrap();

    for (k, _) in std::env::vars() {
        if k.starts_with("JIKAN_RELAY__") {
            std::env::remove_var(k);
        }
    }
    std::env::remove_var("JIKAN_RELAY_ENV");
    std::env::set_var("HOME", &home);
    std::env::set_var("XDG_CONFIG_HOME", &config_home);

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f));

    env_state.restore();

    match result {
        Ok(r) => r,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}
