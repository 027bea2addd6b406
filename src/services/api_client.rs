use crate::errors::ApiError;
use crate::services::endpoints::EndpointCandidates;
use crate::services::logger::Logger;
use crate::services::request::{
    ExtraHeaders, QueryParams, RequestBuilder, RequestDescriptor,
};
use crate::services::session::SessionService;
use crate::services::transport::{RawResponse, Transport};
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use url::Url;

/// Turns a transport response into a decoded value or a structured failure.
///
/// `Ok(None)` means the gateway answered 2xx with an empty body, which is
/// not the same as a JSON `null`, `{}` or `[]`.
pub fn decode_response(raw: RawResponse) -> Result<Option<Value>, ApiError> {
    if !raw.is_success() {
        let detail = if raw.body.is_empty() {
            None
        } else {
            Some(serde_json::from_str(&raw.body).unwrap_or(Value::String(raw.body)))
        };
        return Err(ApiError::remote(raw.status, detail));
    }
    if raw.body.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(&raw.body).map(Some).map_err(|err| {
        ApiError::decode(format!("Gateway returned malformed JSON: {}", err))
            .with_detail(serde_json::json!({ "status": raw.status }))
    })
}

enum Resolution {
    Trying(usize),
    Succeeded(Option<Value>),
    FailedTerminal(ApiError),
    ExhaustedNoMatch,
}

#[derive(Clone)]
pub struct ApiClient {
    logger: Logger,
    builder: RequestBuilder,
    transport: Arc<dyn Transport>,
    session: Arc<SessionService>,
}

impl ApiClient {
    pub fn new(
        logger: Logger,
        base_url: &Url,
        transport: Arc<dyn Transport>,
        session: Arc<SessionService>,
    ) -> Self {
        Self {
            logger: logger.child("api"),
            builder: RequestBuilder::new(base_url),
            transport,
            session,
        }
    }

    pub fn session(&self) -> &Arc<SessionService> {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        self.builder.base_url()
    }

    /// Builds the request from the session as it is now, dispatches it and
    /// decodes the answer.
    pub async fn send(&self, descriptor: RequestDescriptor) -> Result<Option<Value>, ApiError> {
        let snapshot = self.session.snapshot()?;
        let prepared = self.builder.build(&descriptor, &snapshot)?;
        self.logger.debug(
            "request",
            Some(&serde_json::json!({
                "method": prepared.method.as_str(),
                "path": descriptor.path,
                "authenticated": snapshot.token.is_some(),
            })),
        );
        let raw = self.transport.send(prepared).await?;
        decode_response(raw).map_err(|err| {
            self.logger.debug(
                "request failed",
                Some(&serde_json::json!({
                    "method": descriptor.method.as_str(),
                    "path": descriptor.path,
                    "kind": err.kind,
                    "status": err.status,
                })),
            );
            err
        })
    }

    pub async fn get(
        &self,
        path: &str,
        query: Option<QueryParams>,
    ) -> Result<Option<Value>, ApiError> {
        let mut descriptor = RequestDescriptor::new(Method::GET, path);
        descriptor.query = query;
        self.send(descriptor).await
    }

    pub async fn post(
        &self,
        path: &str,
        body: Option<Value>,
        extra_headers: Option<ExtraHeaders>,
    ) -> Result<Option<Value>, ApiError> {
        let mut descriptor = RequestDescriptor::new(Method::POST, path);
        descriptor.body = body;
        descriptor.extra_headers = extra_headers;
        self.send(descriptor).await
    }

    pub async fn put(&self, path: &str, body: Option<Value>) -> Result<Option<Value>, ApiError> {
        let mut descriptor = RequestDescriptor::new(Method::PUT, path);
        descriptor.body = body;
        self.send(descriptor).await
    }

    pub async fn patch(&self, path: &str, body: Option<Value>) -> Result<Option<Value>, ApiError> {
        let mut descriptor = RequestDescriptor::new(Method::PATCH, path);
        descriptor.body = body;
        self.send(descriptor).await
    }

    pub async fn delete(&self, path: &str, body: Option<Value>) -> Result<Option<Value>, ApiError> {
        let mut descriptor = RequestDescriptor::new(Method::DELETE, path);
        descriptor.body = body;
        self.send(descriptor).await
    }

    /// Tries each candidate path strictly in order. Only a 404 moves on to
    /// the next path; any other failure is returned as-is so a
    /// non-idempotent call is never repeated elsewhere.
    pub async fn resolve_candidates(
        &self,
        method: Method,
        candidates: &EndpointCandidates,
        body: Option<Value>,
    ) -> Result<Option<Value>, ApiError> {
        let paths = candidates.paths;
        let mut last_miss: Option<Value> = None;
        let mut state = if paths.is_empty() {
            Resolution::ExhaustedNoMatch
        } else {
            Resolution::Trying(0)
        };

        loop {
            state = match state {
                Resolution::Trying(index) => {
                    let mut descriptor = RequestDescriptor::new(method.clone(), paths[index]);
                    descriptor.body = body.clone();
                    match self.send(descriptor).await {
                        Ok(value) => Resolution::Succeeded(value),
                        Err(err) if err.is_not_found() => {
                            self.logger.debug(
                                "candidate not found",
                                Some(&serde_json::json!({
                                    "operation": candidates.operation,
                                    "path": paths[index],
                                })),
                            );
                            last_miss = err.detail;
                            if index + 1 < paths.len() {
                                Resolution::Trying(index + 1)
                            } else {
                                Resolution::ExhaustedNoMatch
                            }
                        }
                        Err(err) => Resolution::FailedTerminal(err),
                    }
                }
                Resolution::Succeeded(value) => return Ok(value),
                Resolution::FailedTerminal(err) => return Err(err),
                Resolution::ExhaustedNoMatch => {
                    self.logger.warn(
                        "no candidate endpoint matched",
                        Some(&serde_json::json!({
                            "operation": candidates.operation,
                            "tried": paths.len(),
                        })),
                    );
                    let mut err = ApiError::endpoint_not_found(candidates.operation, paths);
                    if let (Some(Value::Object(detail)), Some(miss)) =
                        (err.detail.as_mut(), last_miss.take())
                    {
                        detail.insert("last_detail".to_string(), miss);
                    }
                    return Err(err);
                }
            };
        }
    }
}
