use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Message carried by every failure that came back from the gateway with a
/// non-2xx status. Callers branch on `status`/`detail`, never on this text.
pub const API_ERROR_MESSAGE: &str = "API Error";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    /// The request never produced an HTTP status (DNS, TLS, connection reset).
    Transport,
    /// The gateway answered outside 200-299.
    Remote,
    /// The gateway answered 2xx with a body that is not JSON.
    Decode,
    /// Every candidate path of a resolution sequence answered 404.
    EndpointNotFound,
    InvalidRequest,
    Auth,
    Storage,
}

#[derive(Debug, Clone, Serialize, Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            detail: None,
            message: message.into(),
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = Some(detail);
        self
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Transport, message)
    }

    pub fn remote(status: u16, detail: Option<Value>) -> Self {
        Self {
            kind: ApiErrorKind::Remote,
            status: Some(status),
            detail,
            message: API_ERROR_MESSAGE.to_string(),
            hint: None,
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Decode, message)
    }

    pub fn endpoint_not_found(operation: &str, tried: &[&str]) -> Self {
        Self::new(
            ApiErrorKind::EndpointNotFound,
            format!("{} endpoint not found", operation),
        )
        .with_detail(serde_json::json!({
            "operation": operation,
            "tried": tried,
        }))
        .with_hint("No candidate route exists on this gateway; check the deployment's route table.")
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::InvalidRequest, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Auth, message)
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Storage, message)
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ApiErrorKind::Remote && self.status == Some(404)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind == ApiErrorKind::Remote && self.status == Some(401)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::transport(format!("Gateway request failed: {}", err))
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_404_is_not_found_but_exhaustion_is_not() {
        let remote = ApiError::remote(404, None);
        assert!(remote.is_not_found());
        assert_eq!(remote.message, API_ERROR_MESSAGE);

        let exhausted = ApiError::endpoint_not_found("wikipedia query", &["/a", "/b"]);
        assert!(!exhausted.is_not_found());
        assert_eq!(exhausted.kind, ApiErrorKind::EndpointNotFound);
        assert_eq!(exhausted.status(), None);
        assert_eq!(
            exhausted.detail.as_ref().and_then(|d| d.get("tried")),
            Some(&serde_json::json!(["/a", "/b"]))
        );
    }

    #[test]
    fn serializes_without_empty_fields() {
        let err = ApiError::transport("connection refused");
        let value = serde_json::to_value(&err).expect("serialize");
        assert_eq!(value["kind"], "transport");
        assert!(value.get("status").is_none());
        assert!(value.get("detail").is_none());
    }
}
