//! Framework request: method, path, params, headers, body and call context

use std::collections::HashMap;

use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde::de::DeserializeOwned;

use crate::api::error::ApiError;
use crate::domain::storage::CallContext;

/// An inbound request as seen by middleware and terminal handlers
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    params: HashMap<String, String>,
    headers: HeaderMap,
    /// `None` when the transport could not read the body (e.g. it was too large)
    body: Option<Bytes>,
    context: CallContext,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: HashMap::new(),
            headers: HeaderMap::new(),
            body: Some(Bytes::new()),
            context: CallContext::background(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn with_params(mut self, params: HashMap<String, String>) -> Self {
        self.params = params;
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: Option<Bytes>) -> Self {
        self.body = body;
        self
    }

    pub fn with_context(mut self, context: CallContext) -> Self {
        self.context = context;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Value of a named path segment such as `id` in `/users/{id}`
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Decodes the JSON body; unreadable or undecodable bodies are `MalformedRequest`
    pub fn parse_body<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        let body = self
            .body
            .as_ref()
            .ok_or_else(|| ApiError::malformed("Invalid request payload").with_cause("body unreadable"))?;

        serde_json::from_slice(body)
            .map_err(|e| ApiError::malformed("Invalid request payload").with_cause(e))
    }

    /// Cancellation context for storage calls made on behalf of this request
    pub fn context(&self) -> &CallContext {
        &self.context
    }
}
