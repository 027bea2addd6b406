use crate::constants::network;
use crate::errors::ApiError;
use crate::services::session::SessionState;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde_json::Value;
use std::fmt;
use url::Url;

/// Characters escaped when user input is interpolated into one path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

pub fn encode_segment(raw: &str) -> String {
    utf8_percent_encode(raw, PATH_SEGMENT).to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl fmt::Display for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryValue::Text(s) => write!(f, "{}", s),
            QueryValue::Integer(n) => write!(f, "{}", n),
            QueryValue::Float(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Text(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Text(value)
    }
}

impl From<i64> for QueryValue {
    fn from(value: i64) -> Self {
        QueryValue::Integer(value)
    }
}

impl From<u32> for QueryValue {
    fn from(value: u32) -> Self {
        QueryValue::Integer(i64::from(value))
    }
}

impl From<f64> for QueryValue {
    fn from(value: f64) -> Self {
        QueryValue::Float(value)
    }
}

pub type QueryParams = Vec<(String, QueryValue)>;
pub type ExtraHeaders = Vec<(String, String)>;

/// One logical gateway call, before session headers are attached.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    pub path: String,
    pub query: Option<QueryParams>,
    pub body: Option<Value>,
    pub extra_headers: Option<ExtraHeaders>,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: None,
            body: None,
            extra_headers: None,
        }
    }

    pub fn with_query(mut self, query: QueryParams) -> Self {
        self.query = Some(query);
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_headers(mut self, headers: ExtraHeaders) -> Self {
        self.extra_headers = Some(headers);
        self
    }
}

#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

impl PreparedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[derive(Debug, Clone)]
pub struct RequestBuilder {
    base_url: String,
}

impl RequestBuilder {
    pub fn new(base_url: &Url) -> Self {
        Self {
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Composes the request against `session` as it is right now. The
    /// result does not change if the session is rotated afterwards.
    pub fn build(
        &self,
        descriptor: &RequestDescriptor,
        session: &SessionState,
    ) -> Result<PreparedRequest, ApiError> {
        let url = self.build_url(&descriptor.path, descriptor.query.as_ref())?;
        let headers = build_headers(descriptor.extra_headers.as_ref(), session)?;
        let body = match &descriptor.body {
            Some(value) => Some(serde_json::to_string(value).map_err(|err| {
                ApiError::invalid_request(format!("Request body is not serializable: {}", err))
            })?),
            None => None,
        };
        Ok(PreparedRequest {
            method: descriptor.method.clone(),
            url,
            headers,
            body,
        })
    }

    fn build_url(&self, path: &str, query: Option<&QueryParams>) -> Result<Url, ApiError> {
        if !path.starts_with('/') || path.starts_with("//") || path.contains("://") {
            return Err(ApiError::invalid_request(
                "Request path must be server-relative (start with '/', no host)",
            )
            .with_detail(serde_json::json!({ "path": path })));
        }
        let mut url = Url::parse(&format!("{}{}", self.base_url, path)).map_err(|err| {
            ApiError::invalid_request(format!("Invalid request URL: {}", err))
                .with_detail(serde_json::json!({ "base_url": self.base_url, "path": path }))
        })?;
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, &value.to_string());
            }
        }
        Ok(url)
    }
}

fn build_headers(
    extra: Option<&ExtraHeaders>,
    session: &SessionState,
) -> Result<HeaderMap, ApiError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static(network::CONTENT_TYPE_JSON),
    );
    for (name, value) in extra.into_iter().flatten() {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
            ApiError::invalid_request(format!("Invalid header name: {}", name))
        })?;
        let header_value = HeaderValue::from_str(value).map_err(|_| {
            ApiError::invalid_request(format!("Invalid value for header {}", name))
        })?;
        headers.insert(header_name, header_value);
    }
    if let Some(token) = session.token.as_deref() {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
            ApiError::invalid_request("Stored token is not a valid header value")
                .with_hint("Log in again to replace the stored token.")
        })?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }
    if let Some(user_id) = session.user_id() {
        let value = HeaderValue::from_str(user_id).map_err(|_| {
            ApiError::invalid_request("Stored user id is not a valid header value")
        })?;
        headers.insert(HeaderName::from_static(network::HEADER_USER_ID), value);
    }
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ApiErrorKind;
    use crate::services::session::UserProfile;

    fn builder() -> RequestBuilder {
        RequestBuilder::new(&Url::parse("https://gw.example.dev/").expect("url"))
    }

    fn full_session() -> SessionState {
        SessionState {
            token: Some("T".to_string()),
            user: Some(UserProfile::new("U", "u@example.com", "u", "U U")),
        }
    }

    #[test]
    fn headers_follow_session_presence() {
        let descriptor = RequestDescriptor::new(Method::GET, "/users/me");

        let both = builder().build(&descriptor, &full_session()).expect("build");
        assert_eq!(both.header("authorization"), Some("Bearer T"));
        assert_eq!(both.header("x-user-id"), Some("U"));
        assert_eq!(both.header("content-type"), Some("application/json"));

        let mut no_token = full_session();
        no_token.token = None;
        let req = builder().build(&descriptor, &no_token).expect("build");
        assert!(req.header("authorization").is_none());
        assert_eq!(req.header("x-user-id"), Some("U"));

        let mut no_user = full_session();
        no_user.user = None;
        let req = builder().build(&descriptor, &no_user).expect("build");
        assert_eq!(req.header("authorization"), Some("Bearer T"));
        assert!(req.header("x-user-id").is_none());
    }

    #[test]
    fn session_headers_override_extra_headers() {
        let descriptor = RequestDescriptor::new(Method::POST, "/presence/").with_headers(vec![
            ("Authorization".to_string(), "Basic abc".to_string()),
            ("Content-Type".to_string(), "text/plain".to_string()),
            ("X-Trace".to_string(), "1".to_string()),
        ]);
        let req = builder().build(&descriptor, &full_session()).expect("build");
        assert_eq!(req.header("authorization"), Some("Bearer T"));
        assert_eq!(req.header("content-type"), Some("text/plain"));
        assert_eq!(req.header("x-trace"), Some("1"));
    }

    #[test]
    fn query_values_are_stringified_in_order() {
        let descriptor = RequestDescriptor::new(Method::GET, "/messages/threads/t1").with_query(
            vec![
                ("limit".to_string(), QueryValue::from(50u32)),
                ("cursor".to_string(), QueryValue::from("a b&c")),
            ],
        );
        let req = builder().build(&descriptor, &SessionState::default()).expect("build");
        assert_eq!(
            req.url.as_str(),
            "https://gw.example.dev/messages/threads/t1?limit=50&cursor=a+b%26c"
        );
    }

    #[test]
    fn absolute_paths_are_rejected() {
        for path in ["https://evil.example/x", "//evil.example/x", "users/me"] {
            let descriptor = RequestDescriptor::new(Method::GET, path);
            let err = builder()
                .build(&descriptor, &SessionState::default())
                .expect_err("must reject");
            assert_eq!(err.kind, ApiErrorKind::InvalidRequest);
        }
    }

    #[test]
    fn body_is_serialized_only_when_present() {
        let empty = RequestDescriptor::new(Method::DELETE, "/channels/members");
        let req = builder().build(&empty, &SessionState::default()).expect("build");
        assert!(req.body.is_none());

        let with_body = RequestDescriptor::new(Method::DELETE, "/channels/threads")
            .with_body(serde_json::json!({"thread_id": "t1"}));
        let req = builder().build(&with_body, &SessionState::default()).expect("build");
        assert_eq!(req.body.as_deref(), Some(r#"{"thread_id":"t1"}"#));
    }

    #[test]
    fn segments_are_escaped() {
        assert_eq!(encode_segment("rust lang/2024?"), "rust%20lang%2F2024%3F");
        assert_eq!(encode_segment("plain-id_1"), "plain-id_1");
    }
}
