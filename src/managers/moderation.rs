use crate::constants::pagination;
use crate::errors::ApiError;
use crate::managers::{or_null, to_body};
use crate::services::api_client::ApiClient;
use crate::services::request::{encode_segment, QueryValue};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Serialize)]
pub struct ModerationCheck {
    pub message_id: String,
    pub user_id: String,
    pub channel_id: String,
    pub content: String,
}

#[derive(Clone)]
pub struct ModerationManager {
    api: ApiClient,
}

impl ModerationManager {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn check(&self, check: &ModerationCheck) -> Result<Value, ApiError> {
        Ok(or_null(
            self.api
                .post("/moderation/check", Some(to_body(check)?), None)
                .await?,
        ))
    }

    pub async fn user_status(&self, user_id: &str, channel_id: &str) -> Result<Value, ApiError> {
        let path = format!(
            "/moderation/status/{}/{}",
            encode_segment(user_id),
            encode_segment(channel_id)
        );
        Ok(or_null(self.api.get(&path, None).await?))
    }

    pub async fn blacklist(&self, limit: Option<u32>, skip: Option<u32>) -> Result<Value, ApiError> {
        let query = vec![
            (
                "limit".to_string(),
                QueryValue::from(limit.unwrap_or(pagination::BLACKLIST_LIMIT)),
            ),
            ("skip".to_string(), QueryValue::from(skip.unwrap_or(0))),
        ];
        Ok(or_null(self.api.get("/moderation/blacklist", Some(query)).await?))
    }

    pub async fn add_word(&self, word: Value) -> Result<Value, ApiError> {
        Ok(or_null(
            self.api
                .post("/moderation/blacklist", Some(word), None)
                .await?,
        ))
    }

    pub async fn remove_word(&self, word_id: &str) -> Result<Value, ApiError> {
        let path = format!("/moderation/blacklist/{}", encode_segment(word_id));
        Ok(or_null(self.api.delete(&path, None).await?))
    }

    pub async fn banned_users(&self) -> Result<Value, ApiError> {
        Ok(or_null(
            self.api.get("/moderation/admin/banned-users", None).await?,
        ))
    }
}
