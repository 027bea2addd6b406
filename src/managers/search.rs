use crate::errors::ApiError;
use crate::services::api_client::ApiClient;
use crate::services::envelope::ResponseEnvelope;
use crate::services::request::{encode_segment, QueryValue};
use serde_json::Value;

/// What a thread search filters on. Each maps to its own gateway route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThreadFilter {
    Id(String),
    Keyword(String),
    Author(String),
    Status(String),
    DateRange { start_date: String, end_date: String },
}

#[derive(Clone)]
pub struct SearchManager {
    api: ApiClient,
}

impl SearchManager {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    async fn query(&self, path: &str, q: &str) -> Result<Vec<Value>, ApiError> {
        let query = vec![("q".to_string(), QueryValue::from(q))];
        let payload = self.api.get(path, Some(query)).await?;
        Ok(ResponseEnvelope::from_payload(payload).into_items())
    }

    pub async fn messages(&self, q: &str) -> Result<Vec<Value>, ApiError> {
        self.query("/search/messages", q).await
    }

    pub async fn files(&self, q: &str) -> Result<Vec<Value>, ApiError> {
        self.query("/search/files", q).await
    }

    pub async fn channels(&self, q: &str) -> Result<Vec<Value>, ApiError> {
        self.query("/search/channels", q).await
    }

    pub async fn threads(&self, filter: &ThreadFilter) -> Result<Vec<Value>, ApiError> {
        let payload = match filter {
            ThreadFilter::Id(id) => {
                let path = format!("/search/threads/id/{}", encode_segment(id));
                self.api.get(&path, None).await?
            }
            ThreadFilter::Keyword(keyword) => {
                let path = format!("/search/threads/keyword/{}", encode_segment(keyword));
                self.api.get(&path, None).await?
            }
            ThreadFilter::Author(author) => {
                let path = format!("/search/threads/author/{}", encode_segment(author));
                self.api.get(&path, None).await?
            }
            ThreadFilter::Status(status) => {
                let path = format!("/search/threads/status/{}", encode_segment(status));
                self.api.get(&path, None).await?
            }
            ThreadFilter::DateRange {
                start_date,
                end_date,
            } => {
                let query = vec![
                    ("start_date".to_string(), QueryValue::from(start_date.as_str())),
                    ("end_date".to_string(), QueryValue::from(end_date.as_str())),
                ];
                self.api.get("/search/threads/daterange", Some(query)).await?
            }
        };
        Ok(ResponseEnvelope::from_payload(payload).into_items())
    }
}
