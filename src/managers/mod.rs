pub mod auth;
pub mod channels;
pub mod chatbots;
pub mod messages;
pub mod moderation;
pub mod presence;
pub mod search;

use crate::errors::ApiError;
use serde::Serialize;
use serde_json::Value;

/// A decoded body, with an empty answer rendered as JSON `null`.
pub(crate) fn or_null(payload: Option<Value>) -> Value {
    payload.unwrap_or(Value::Null)
}

pub(crate) fn to_body<T: Serialize>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value)
        .map_err(|err| ApiError::invalid_request(format!("Request body is not serializable: {}", err)))
}
