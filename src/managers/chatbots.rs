use crate::constants::chatbots as defaults;
use crate::errors::ApiError;
use crate::managers::or_null;
use crate::services::api_client::ApiClient;
use crate::services::endpoints::{PROGRAMMING_QUERY, WIKIPEDIA_QUERY};
use crate::services::envelope::extract_answer;
use crate::services::logger::Logger;
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Serialize)]
pub struct ChatbotReply {
    pub answer: String,
    pub raw: Value,
}

impl ChatbotReply {
    fn from_payload(payload: Option<Value>) -> Self {
        Self {
            answer: extract_answer(payload.as_ref()),
            raw: or_null(payload),
        }
    }
}

#[derive(Clone)]
pub struct ChatbotManager {
    logger: Logger,
    api: ApiClient,
}

impl ChatbotManager {
    pub fn new(logger: Logger, api: ApiClient) -> Self {
        Self {
            logger: logger.child("chatbots"),
            api,
        }
    }

    pub async fn ask_wikipedia(
        &self,
        question: &str,
        language: Option<&str>,
    ) -> Result<ChatbotReply, ApiError> {
        let payload = serde_json::json!({
            "question": question,
            "language": language.unwrap_or(defaults::WIKIPEDIA_DEFAULT_LANGUAGE),
        });
        self.logger.debug("asking wikipedia bot", None);
        let reply = self
            .api
            .resolve_candidates(Method::POST, &WIKIPEDIA_QUERY, Some(payload))
            .await?;
        Ok(ChatbotReply::from_payload(reply))
    }

    /// The programming bot takes `{message, context?}` rather than
    /// `{question}`.
    pub async fn ask_programming(
        &self,
        question: &str,
        context: Option<&str>,
    ) -> Result<ChatbotReply, ApiError> {
        let mut payload = serde_json::Map::new();
        payload.insert("message".to_string(), Value::String(question.to_string()));
        if let Some(context) = context.filter(|c| !c.is_empty()) {
            payload.insert("context".to_string(), Value::String(context.to_string()));
        }
        self.logger.debug("asking programming bot", None);
        let reply = self
            .api
            .resolve_candidates(Method::POST, &PROGRAMMING_QUERY, Some(Value::Object(payload)))
            .await?;
        Ok(ChatbotReply::from_payload(reply))
    }

    pub async fn wikipedia_health(&self) -> Result<Value, ApiError> {
        Ok(or_null(self.api.get(defaults::WIKIPEDIA_HEALTH, None).await?))
    }

    pub async fn programming_health(&self) -> Result<Value, ApiError> {
        Ok(or_null(self.api.get(defaults::PROGRAMMING_HEALTH, None).await?))
    }
}
