//! http transport seam.

use crate::config::Config;
use crate::types::{Method, Request};
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

/// per-call context shared by every request of one client call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallContext {
    pub request_id: Uuid,
}

impl CallContext {
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4(),
        }
    }
}

impl Default for CallContext {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("{method} {url} returned {code}: {message}")]
    Status {
        method: Method,
        url: String,
        code: u16,
        message: String,
    },
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl TransportError {
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_conflict(&self) -> bool {
        self.status() == Some(409)
    }
}

/// sends a resolved request and returns the decoded body, if any.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, ctx: &CallContext, request: &Request)
        -> Result<Option<Value>, TransportError>;
}

/// reqwest-backed transport with optional bearer auth.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    token: Option<String>,
}

impl HttpTransport {
    pub fn new(config: &Config, token: Option<String>) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client, token })
    }
}

fn reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        ctx: &CallContext,
        request: &Request,
    ) -> Result<Option<Value>, TransportError> {
        debug!(method = %request.method, url = %request.url, "sending request");
        let mut builder = self
            .client
            .request(reqwest_method(request.method), &request.url)
            .header("x-request-id", ctx.request_id.to_string());
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            let message = error_message(&text);
            warn!(
                method = %request.method,
                url = %request.url,
                status = status.as_u16(),
                "request failed: {}",
                message
            );
            return Err(TransportError::Status {
                method: request.method,
                url: request.url.clone(),
                code: status.as_u16(),
                message,
            });
        }
        if text.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&text)?))
    }
}

/// google-style `{"error": {"message": ...}}` bodies, else the truncated body.
fn error_message(body: &str) -> String {
    let parsed = serde_json::from_str::<Value>(body).ok();
    if let Some(message) = parsed
        .as_ref()
        .and_then(|v| v.pointer("/error/message"))
        .and_then(Value::as_str)
    {
        return message.to_string();
    }
    let trimmed = body.trim();
    if trimmed.chars().count() > 200 {
        let head: String = trimmed.chars().take(200).collect();
        format!("{head}...")
    } else {
        trimmed.to_string()
    }
}
