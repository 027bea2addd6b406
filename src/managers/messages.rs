use crate::constants::pagination;
use crate::errors::ApiError;
use crate::managers::{or_null, to_body};
use crate::services::api_client::ApiClient;
use crate::services::envelope::bare_items;
use crate::services::request::{encode_segment, QueryValue};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Serialize)]
pub struct NewMessage {
    pub content: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

#[derive(Clone)]
pub struct MessagesManager {
    api: ApiClient,
}

impl MessagesManager {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn list(
        &self,
        thread_id: &str,
        limit: Option<u32>,
        cursor: Option<&str>,
    ) -> Result<Vec<Value>, ApiError> {
        let path = format!("/messages/threads/{}", encode_segment(thread_id));
        let mut query = vec![(
            "limit".to_string(),
            QueryValue::from(limit.unwrap_or(pagination::MESSAGES_LIMIT)),
        )];
        if let Some(cursor) = cursor {
            query.push(("cursor".to_string(), QueryValue::from(cursor)));
        }
        Ok(bare_items(self.api.get(&path, Some(query)).await?))
    }

    pub async fn send(&self, thread_id: &str, message: &NewMessage) -> Result<Value, ApiError> {
        let path = format!("/messages/threads/{}", encode_segment(thread_id));
        Ok(or_null(self.api.post(&path, Some(to_body(message)?), None).await?))
    }

    pub async fn update(
        &self,
        thread_id: &str,
        message_id: &str,
        content: &str,
    ) -> Result<Value, ApiError> {
        let path = format!(
            "/messages/threads/{}/messages/{}",
            encode_segment(thread_id),
            encode_segment(message_id)
        );
        let body = serde_json::json!({ "content": content });
        Ok(or_null(self.api.put(&path, Some(body)).await?))
    }

    pub async fn delete(&self, thread_id: &str, message_id: &str) -> Result<Value, ApiError> {
        let path = format!(
            "/messages/threads/{}/messages/{}",
            encode_segment(thread_id),
            encode_segment(message_id)
        );
        Ok(or_null(self.api.delete(&path, None).await?))
    }
}
