use crate::constants::presence as defaults;
use crate::errors::ApiError;
use crate::managers::or_null;
use crate::services::api_client::ApiClient;
use crate::services::logger::Logger;
use crate::services::request::{encode_segment, QueryValue};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize)]
pub struct PresenceUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heartbeat: Option<bool>,
}

#[derive(Clone)]
pub struct PresenceManager {
    logger: Logger,
    api: ApiClient,
}

impl PresenceManager {
    pub fn new(logger: Logger, api: ApiClient) -> Self {
        Self {
            logger: logger.child("presence"),
            api,
        }
    }

    pub async fn register(
        &self,
        user_id: &str,
        status: Option<&str>,
        device: Option<&str>,
    ) -> Result<Value, ApiError> {
        let mut body = serde_json::Map::new();
        body.insert("userId".to_string(), Value::String(user_id.to_string()));
        if let Some(status) = status {
            body.insert("status".to_string(), Value::String(status.to_string()));
        }
        if let Some(device) = device {
            body.insert("device".to_string(), Value::String(device.to_string()));
        }
        Ok(or_null(
            self.api
                .post("/presence/", Some(Value::Object(body)), None)
                .await?,
        ))
    }

    pub async fn go_online(&self, user_id: &str) -> Result<Value, ApiError> {
        self.register(user_id, Some(defaults::ONLINE), Some(defaults::DEVICE))
            .await
    }

    pub async fn update(&self, user_id: &str, update: &PresenceUpdate) -> Result<Value, ApiError> {
        let path = format!("/presence/{}", encode_segment(user_id));
        let body = crate::managers::to_body(update)?;
        Ok(or_null(self.api.patch(&path, Some(body)).await?))
    }

    pub async fn get(&self, user_id: &str) -> Result<Value, ApiError> {
        let path = format!("/presence/{}", encode_segment(user_id));
        Ok(or_null(self.api.get(&path, None).await?))
    }

    /// Stats come back either wrapped in `data` or bare. `results` is not
    /// an envelope here.
    pub async fn stats(&self) -> Result<Value, ApiError> {
        let payload = or_null(self.api.get("/presence/stats", None).await?);
        match payload {
            Value::Object(mut map) => match map.remove("data") {
                Some(data) if !data.is_null() => Ok(data),
                Some(data) => {
                    map.insert("data".to_string(), data);
                    Ok(Value::Object(map))
                }
                None => Ok(Value::Object(map)),
            },
            other => Ok(other),
        }
    }

    pub async fn list(&self, status: Option<&str>) -> Result<Value, ApiError> {
        let query = status.map(|s| vec![("status".to_string(), QueryValue::from(s))]);
        Ok(or_null(self.api.get("/presence/", query).await?))
    }

    pub async fn health(&self) -> Result<Value, ApiError> {
        Ok(or_null(self.api.get("/presence/health", None).await?))
    }

    /// The user's status, or `offline` when it cannot be read.
    pub async fn current_status(&self, user_id: &str) -> String {
        match self.get(user_id).await {
            Ok(payload) => payload
                .get("status")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults::OFFLINE)
                .to_string(),
            Err(err) => {
                self.logger.debug(
                    "presence read failed",
                    Some(&serde_json::json!({ "user_id": user_id, "status": err.status })),
                );
                defaults::OFFLINE.to_string()
            }
        }
    }

    /// Polls a user's status every `period`, starting immediately. Stops
    /// after `ticks` polls when given, otherwise runs until the task is
    /// dropped. A zero period is rejected before the first poll.
    pub async fn watch_status<F>(
        &self,
        user_id: &str,
        period: Duration,
        ticks: Option<usize>,
        mut on_status: F,
    ) -> Result<(), ApiError>
    where
        F: FnMut(&str),
    {
        let mut interval = poll_interval(period)?;
        let mut done = 0usize;
        while ticks.map(|limit| done < limit).unwrap_or(true) {
            interval.tick().await;
            let status = self.current_status(user_id).await;
            on_status(status.as_str());
            done += 1;
        }
        Ok(())
    }

    /// Polls presence stats. A failed poll keeps the last good value, and
    /// nothing is reported until the first success.
    pub async fn watch_stats<F>(
        &self,
        period: Duration,
        ticks: Option<usize>,
        mut on_stats: F,
    ) -> Result<(), ApiError>
    where
        F: FnMut(&Value),
    {
        let mut interval = poll_interval(period)?;
        let mut last: Option<Value> = None;
        let mut done = 0usize;
        while ticks.map(|limit| done < limit).unwrap_or(true) {
            interval.tick().await;
            match self.stats().await {
                Ok(stats) => last = Some(stats),
                Err(err) => self.logger.warn(
                    "Error fetching presence stats",
                    Some(&serde_json::json!({ "kind": err.kind, "status": err.status })),
                ),
            }
            if let Some(stats) = last.as_ref() {
                on_stats(stats);
            }
            done += 1;
        }
        Ok(())
    }
}

fn poll_interval(period: Duration) -> Result<tokio::time::Interval, ApiError> {
    if period.is_zero() {
        return Err(ApiError::invalid_request("poll interval must be non-zero")
            .with_detail(serde_json::json!({ "period_ms": 0 })));
    }
    Ok(tokio::time::interval(period))
}

pub fn default_status_period() -> Duration {
    Duration::from_millis(defaults::USER_POLL_INTERVAL_MS)
}

pub fn default_stats_period() -> Duration {
    Duration::from_millis(defaults::STATS_POLL_INTERVAL_MS)
}
