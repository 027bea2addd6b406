use crate::errors::ApiError;
use crate::services::logger::Logger;
use crate::services::request::PreparedRequest;
use async_trait::async_trait;
use reqwest::Client;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one prepared request. No retries, no deadline beyond whatever the
/// underlying client defaults to.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: PreparedRequest) -> Result<RawResponse, ApiError>;
}

#[derive(Clone)]
pub struct HttpTransport {
    logger: Logger,
    client: Client,
}

impl HttpTransport {
    pub fn new(logger: Logger, user_agent: &str) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|err| ApiError::transport(format!("Failed to build HTTP client: {}", err)))?;
        Ok(Self {
            logger: logger.child("http"),
            client,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: PreparedRequest) -> Result<RawResponse, ApiError> {
        let method = request.method.clone();
        let url = request.url.clone();
        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        let response = builder.send().await.map_err(|err| {
            self.logger.warn(
                "Gateway unreachable",
                Some(&serde_json::json!({
                    "method": method.as_str(),
                    "url": url.as_str(),
                    "error": err.to_string(),
                })),
            );
            ApiError::from(err)
        })?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        self.logger.debug(
            "Gateway responded",
            Some(&serde_json::json!({
                "method": method.as_str(),
                "url": url.as_str(),
                "status": status,
                "bytes": body.len(),
            })),
        );
        Ok(RawResponse { status, body })
    }
}
