#![allow(dead_code)]

use async_trait::async_trait;
use chatgw::app::App;
use chatgw::errors::ApiError;
use chatgw::services::config::ClientConfig;
use chatgw::services::logger::Logger;
use chatgw::services::request::PreparedRequest;
use chatgw::services::session::{MemoryStore, UserProfile};
use chatgw::services::transport::{RawResponse, Transport};
use once_cell::sync::Lazy;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as AsyncMutex;

pub static ENV_LOCK: Lazy<AsyncMutex<()>> = Lazy::new(|| AsyncMutex::new(()));

pub const BASE_URL: &str = "https://gw.test";

/// Answers by `METHOD /path` from a script and records every request it
/// was handed. Unscripted routes answer 404 with an empty body.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<String, VecDeque<Result<RawResponse, ApiError>>>>,
    calls: Mutex<Vec<PreparedRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on(&self, method: &str, path: &str, response: Result<RawResponse, ApiError>) {
        self.routes
            .lock()
            .expect("routes lock")
            .entry(format!("{} {}", method, path))
            .or_default()
            .push_back(response);
    }

    pub fn ok(&self, method: &str, path: &str, body: serde_json::Value) {
        self.on(method, path, Ok(RawResponse::new(200, body.to_string())));
    }

    pub fn status(&self, method: &str, path: &str, status: u16, body: &str) {
        self.on(method, path, Ok(RawResponse::new(status, body)));
    }

    pub fn calls(&self) -> Vec<PreparedRequest> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn called_paths(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|req| req.url.path().to_string())
            .collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: PreparedRequest) -> Result<RawResponse, ApiError> {
        let key = format!("{} {}", request.method.as_str(), request.url.path());
        self.calls.lock().expect("calls lock").push(request);
        let scripted = self
            .routes
            .lock()
            .expect("routes lock")
            .get_mut(&key)
            .and_then(|queue| {
                if queue.len() > 1 {
                    queue.pop_front()
                } else {
                    queue.front().cloned()
                }
            });
        scripted.unwrap_or_else(|| Ok(RawResponse::new(404, "")))
    }
}

pub fn test_config() -> ClientConfig {
    ClientConfig::resolve(Some(BASE_URL), Some(std::env::temp_dir().join("unused.json")))
        .expect("config")
}

pub fn app_with(transport: Arc<ScriptedTransport>) -> App {
    App::with_parts(
        Logger::new("test"),
        test_config(),
        Arc::new(MemoryStore::new()),
        transport,
    )
}

pub fn alice() -> UserProfile {
    UserProfile::new("u-alice", "alice@example.com", "alice", "Alice Liddell")
}
