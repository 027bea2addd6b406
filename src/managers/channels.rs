use crate::errors::ApiError;
use crate::managers::{or_null, to_body};
use crate::services::api_client::ApiClient;
use crate::services::envelope::bare_items;
use crate::services::logger::Logger;
use crate::services::request::encode_segment;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Serialize)]
pub struct NewChannel {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub owner_id: String,
    pub users: Vec<String>,
}

impl NewChannel {
    /// A channel owned by `owner_id` with the owner as its only member.
    pub fn owned_by(name: impl Into<String>, owner_id: impl Into<String>) -> Self {
        let owner_id = owner_id.into();
        Self {
            name: name.into(),
            description: None,
            users: vec![owner_id.clone()],
            owner_id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewThread {
    pub channel_id: String,
    pub thread_id: String,
    pub title: String,
    pub author: String,
    pub category: String,
}

impl NewThread {
    /// Thread ids are minted client-side.
    pub fn new(
        channel_id: impl Into<String>,
        title: impl Into<String>,
        author: impl Into<String>,
        category: Option<String>,
    ) -> Self {
        Self {
            channel_id: channel_id.into(),
            thread_id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            author: author.into(),
            category: category.unwrap_or_else(|| "general".to_string()),
        }
    }
}

#[derive(Clone)]
pub struct ChannelsManager {
    logger: Logger,
    api: ApiClient,
}

impl ChannelsManager {
    pub fn new(logger: Logger, api: ApiClient) -> Self {
        Self {
            logger: logger.child("channels"),
            api,
        }
    }

    pub async fn my_channels(&self, user_id: &str) -> Result<Vec<Value>, ApiError> {
        let path = format!("/channels/members/user/{}", encode_segment(user_id));
        Ok(bare_items(self.api.get(&path, None).await?))
    }

    pub async fn owned_channels(&self, owner_id: &str) -> Result<Vec<Value>, ApiError> {
        let path = format!("/channels/members/owner/{}", encode_segment(owner_id));
        Ok(bare_items(self.api.get(&path, None).await?))
    }

    pub async fn create(&self, channel: &NewChannel) -> Result<Value, ApiError> {
        let created = self
            .api
            .post("/channels/", Some(to_body(channel)?), None)
            .await?;
        self.logger.info(
            "channel created",
            Some(&serde_json::json!({ "name": channel.name })),
        );
        Ok(or_null(created))
    }

    pub async fn get(&self, channel_id: &str) -> Result<Value, ApiError> {
        let path = format!("/channels/{}", encode_segment(channel_id));
        Ok(or_null(self.api.get(&path, None).await?))
    }

    pub async fn get_basic(&self, channel_id: &str) -> Result<Value, ApiError> {
        let path = format!("/channels/{}/basic", encode_segment(channel_id));
        Ok(or_null(self.api.get(&path, None).await?))
    }

    pub async fn update(&self, channel_id: &str, changes: Value) -> Result<Value, ApiError> {
        let path = format!("/channels/{}", encode_segment(channel_id));
        Ok(or_null(self.api.put(&path, Some(changes)).await?))
    }

    pub async fn delete(&self, channel_id: &str) -> Result<Value, ApiError> {
        let path = format!("/channels/{}", encode_segment(channel_id));
        Ok(or_null(self.api.delete(&path, None).await?))
    }

    pub async fn reactivate(&self, channel_id: &str) -> Result<Value, ApiError> {
        let path = format!("/channels/{}/reactivate", encode_segment(channel_id));
        Ok(or_null(
            self.api
                .post(&path, Some(serde_json::json!({})), None)
                .await?,
        ))
    }

    pub async fn members(&self, channel_id: &str) -> Result<Value, ApiError> {
        let path = format!("/channels/{}/members", encode_segment(channel_id));
        Ok(or_null(self.api.get(&path, None).await?))
    }

    pub async fn add_member(
        &self,
        channel_id: &str,
        user_id: &str,
        role: Option<&str>,
    ) -> Result<Value, ApiError> {
        let mut body = serde_json::json!({ "user_id": user_id, "channel_id": channel_id });
        if let (Some(role), Value::Object(map)) = (role, &mut body) {
            map.insert("role".to_string(), Value::String(role.to_string()));
        }
        Ok(or_null(self.api.post("/channels/members", Some(body), None).await?))
    }

    pub async fn remove_member(&self, channel_id: &str, user_id: &str) -> Result<Value, ApiError> {
        let body = serde_json::json!({ "user_id": user_id, "channel_id": channel_id });
        Ok(or_null(self.api.delete("/channels/members", Some(body)).await?))
    }

    pub async fn threads(&self, channel_id: &str) -> Result<Vec<Value>, ApiError> {
        let path = format!("/channels/{}/threads", encode_segment(channel_id));
        Ok(bare_items(self.api.get(&path, None).await?))
    }

    pub async fn thread(&self, thread_id: &str) -> Result<Value, ApiError> {
        let path = format!("/channels/threads/{}", encode_segment(thread_id));
        Ok(or_null(self.api.get(&path, None).await?))
    }

    pub async fn create_thread(&self, thread: &NewThread) -> Result<Value, ApiError> {
        Ok(or_null(
            self.api
                .post("/channels/threads", Some(to_body(thread)?), None)
                .await?,
        ))
    }

    pub async fn delete_thread(&self, thread_id: &str) -> Result<Value, ApiError> {
        let body = serde_json::json!({ "thread_id": thread_id });
        Ok(or_null(self.api.delete("/channels/threads", Some(body)).await?))
    }
}
