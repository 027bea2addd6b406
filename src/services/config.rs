use crate::constants::{env as env_keys, network};
use crate::errors::ApiError;
use crate::utils::paths::{normalize_env_value, resolve_session_path};
use std::path::PathBuf;
use url::Url;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    pub session_path: PathBuf,
    pub user_agent: String,
}

impl ClientConfig {
    /// Explicit overrides win over the environment, which wins over the
    /// built-in defaults.
    pub fn resolve(
        base_url: Option<&str>,
        session_path: Option<PathBuf>,
    ) -> Result<Self, ApiError> {
        let raw_base = base_url
            .map(|s| s.to_string())
            .and_then(|s| normalize_env_value(Some(s)))
            .or_else(|| normalize_env_value(std::env::var(env_keys::BASE_URL).ok()))
            .unwrap_or_else(|| network::DEFAULT_BASE_URL.to_string());
        Ok(Self {
            base_url: normalize_base_url(&raw_base)?,
            session_path: session_path.unwrap_or_else(resolve_session_path),
            user_agent: network::USER_AGENT.to_string(),
        })
    }
}

pub fn normalize_base_url(raw: &str) -> Result<Url, ApiError> {
    let raw = raw.trim();
    let mut url = Url::parse(raw).map_err(|_| {
        ApiError::invalid_request("Invalid gateway base URL")
            .with_hint("Expected a URL such as \"https://gateway.example.com\".")
            .with_detail(serde_json::json!({ "base_url": raw }))
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ApiError::invalid_request("Gateway base URL must use http or https")
            .with_detail(serde_json::json!({ "base_url": raw })));
    }
    url.set_fragment(None);
    url.set_query(None);
    let trimmed = url.path().trim_end_matches('/').to_string();
    url.set_path(&trimmed);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let url = normalize_base_url("https://gw.example.dev/api/?x=1#frag").expect("url");
        assert_eq!(url.as_str(), "https://gw.example.dev/api");
    }

    #[test]
    fn non_http_base_url_is_rejected() {
        assert!(normalize_base_url("ftp://gw.example.dev").is_err());
        assert!(normalize_base_url("not a url").is_err());
    }

    #[test]
    fn explicit_override_wins() {
        let config = ClientConfig::resolve(
            Some("http://127.0.0.1:8080/"),
            Some(PathBuf::from("/tmp/chatgw-session.json")),
        )
        .expect("config");
        assert_eq!(config.base_url.as_str(), "http://127.0.0.1:8080/");
        assert_eq!(config.session_path, PathBuf::from("/tmp/chatgw-session.json"));
    }
}
