//! In-memory transport and clock for tests (feature `test-support`)

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::clock::Clock;
use crate::error::TransportError;
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};

enum Scripted {
    Response(HttpResponse),
    Error(String),
}

/// Replays queued responses keyed by `"METHOD /path"` and records every request.
///
/// Queued entries are consumed in order; a key with an empty queue falls back
/// to its sticky response (see [`ScriptedTransport::always`]), and a key with
/// neither fails like an unreachable server.
#[derive(Default)]
pub struct ScriptedTransport {
    queued: Mutex<HashMap<String, VecDeque<Scripted>>>,
    sticky: Mutex<HashMap<String, HttpResponse>>,
    sent: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, key: &str, response: HttpResponse) {
        lock(&self.queued)
            .entry(key.to_string())
            .or_default()
            .push_back(Scripted::Response(response));
    }

    pub fn push_error(&self, key: &str, reason: &str) {
        lock(&self.queued)
            .entry(key.to_string())
            .or_default()
            .push_back(Scripted::Error(reason.to_string()));
    }

    pub fn always(&self, key: &str, response: HttpResponse) {
        lock(&self.sticky).insert(key.to_string(), response);
    }

    /// Queue one full login cycle: settings CSRF, auth, endpoint list
    pub fn push_login(&self, jwt: &str, endpoints: serde_json::Value) {
        self.push(
            "GET /api/settings",
            HttpResponse::new(200).with_header("X-Csrf-Token", format!("pre-{jwt}")),
        );
        self.push(
            "POST /api/auth",
            HttpResponse::new(200)
                .with_header("X-CSRF-TOKEN", format!("csrf-{jwt}"))
                .with_json(&serde_json::json!({ "jwt": jwt })),
        );
        self.push(
            "GET /api/endpoints",
            HttpResponse::new(200).with_json(&endpoints),
        );
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        lock(&self.sent).clone()
    }

    /// Number of recorded requests matching `"METHOD /path"`
    pub fn count(&self, key: &str) -> usize {
        lock(&self.sent).iter().filter(|r| key_of(r) == key).count()
    }

    pub fn total(&self) -> usize {
        lock(&self.sent).len()
    }

    pub fn clear_requests(&self) {
        lock(&self.sent).clear();
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let key = key_of(&request);
        lock(&self.sent).push(request);

        let next = lock(&self.queued)
            .get_mut(&key)
            .and_then(VecDeque::pop_front);
        match next {
            Some(Scripted::Response(resp)) => Ok(resp),
            Some(Scripted::Error(reason)) => Err(TransportError::Unavailable(reason)),
            None => lock(&self.sticky)
                .get(&key)
                .cloned()
                .ok_or_else(|| TransportError::Unavailable(format!("no scripted response for {key}"))),
        }
    }
}

fn key_of(request: &HttpRequest) -> String {
    format!("{} {}", request.method.as_str(), request.path)
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Clock that only moves when told to
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::at(Utc.timestamp_opt(1_700_000_000, 0).single().unwrap_or_default())
    }

    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance_secs(&self, secs: i64) {
        *lock(&self.now) += chrono::Duration::seconds(secs);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *lock(&self.now)
    }
}
