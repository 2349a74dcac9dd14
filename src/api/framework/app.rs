//! Route table and the adapter that mounts it on an axum `Router`

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::time::Duration;

use axum::extract::rejection::RawPathParamsRejection;
use axum::extract::RawPathParams;
use axum::http::StatusCode;
use axum::routing::{MethodFilter, MethodRouter};
use axum::Router;
use tracing::{debug, warn};

use super::handler::{terminal, Handler, Middleware};
use super::request::Request;
use super::response::{Reply, Response};
use crate::api::error::ApiError;
use crate::domain::storage::CallContext;

/// Largest request body read into memory; larger bodies are rejected as malformed
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    fn filter(self) -> MethodFilter {
        match self {
            Self::Get => MethodFilter::GET,
            Self::Post => MethodFilter::POST,
            Self::Put => MethodFilter::PUT,
            Self::Delete => MethodFilter::DELETE,
        }
    }
}

struct Route {
    method: HttpMethod,
    path: String,
    handler: Handler,
}

/// Route table plus the ordered global middleware list
#[derive(Default)]
pub struct App {
    middlewares: Vec<Middleware>,
    routes: Vec<Route>,
    request_timeout: Option<Duration>,
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deadline given to the `CallContext` of every request
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Appends a middleware. It wraps only routes registered after this call.
    pub fn use_middleware(&mut self, middleware: Middleware) -> &mut Self {
        self.middlewares.push(middleware);
        self
    }

    /// Starts a group of routes sharing a path prefix
    pub fn route(&mut self, prefix: &str) -> RouteGroup<'_> {
        RouteGroup {
            app: self,
            prefix: prefix.to_string(),
        }
    }

    /// Registers a terminal handler, wrapping it with the current middleware chain
    pub fn handle<H, Fut>(&mut self, method: HttpMethod, path: &str, handler: H) -> &mut Self
    where
        H: Fn(Request, Response) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Reply, ApiError>> + Send + 'static,
    {
        let wrapped = self.wrap(terminal(handler));

        debug!(method = ?method, path = %path, middlewares = self.middlewares.len(), "Route registered");
        self.routes.push(Route {
            method,
            path: path.to_string(),
            handler: wrapped,
        });
        self
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Applies the current middleware chain around `handler`
    fn wrap(&self, handler: Handler) -> Handler {
        // Wrap innermost-first so the first-registered middleware ends up outermost
        self.middlewares
            .iter()
            .rev()
            .fold(handler, |inner, middleware| middleware(inner))
    }

    /// Finalises the table into an axum router. Routes sharing a path are merged.
    ///
    /// Unknown paths and unregistered methods on known paths get a JSON error
    /// envelope and pass through the full middleware chain like any route.
    pub fn into_router(self) -> Router {
        let timeout = self.request_timeout;
        let not_found = self.wrap(terminal(|_req, res: Response| async move {
            Ok(res.error(StatusCode::NOT_FOUND, "Route not found"))
        }));
        let method_not_allowed = self.wrap(terminal(|_req, res: Response| async move {
            Ok(res.error(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed"))
        }));
        let mut by_path: BTreeMap<String, MethodRouter> = BTreeMap::new();

        for route in self.routes {
            let handler = route.handler;
            let endpoint = move |params: Result<RawPathParams, RawPathParamsRejection>,
                                 request: axum::extract::Request| {
                dispatch(handler.clone(), timeout, path_params(params), request)
            };

            let method_router = by_path.remove(&route.path).unwrap_or_else(MethodRouter::new);
            by_path.insert(route.path, method_router.on(route.method.filter(), endpoint));
        }

        by_path
            .into_iter()
            .fold(Router::new(), |router, (path, method_router)| {
                router.route(&path, method_router)
            })
            .method_not_allowed_fallback(move |request: axum::extract::Request| {
                dispatch(method_not_allowed.clone(), timeout, HashMap::new(), request)
            })
            .fallback(move |request: axum::extract::Request| {
                dispatch(not_found.clone(), timeout, HashMap::new(), request)
            })
    }
}

/// Fluent registration under a shared prefix
pub struct RouteGroup<'a> {
    app: &'a mut App,
    prefix: String,
}

impl RouteGroup<'_> {
    pub fn get<H, Fut>(self, path: &str, handler: H) -> Self
    where
        H: Fn(Request, Response) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Reply, ApiError>> + Send + 'static,
    {
        self.register(HttpMethod::Get, path, handler)
    }

    pub fn post<H, Fut>(self, path: &str, handler: H) -> Self
    where
        H: Fn(Request, Response) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Reply, ApiError>> + Send + 'static,
    {
        self.register(HttpMethod::Post, path, handler)
    }

    pub fn put<H, Fut>(self, path: &str, handler: H) -> Self
    where
        H: Fn(Request, Response) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Reply, ApiError>> + Send + 'static,
    {
        self.register(HttpMethod::Put, path, handler)
    }

    pub fn delete<H, Fut>(self, path: &str, handler: H) -> Self
    where
        H: Fn(Request, Response) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Reply, ApiError>> + Send + 'static,
    {
        self.register(HttpMethod::Delete, path, handler)
    }

    fn register<H, Fut>(self, method: HttpMethod, path: &str, handler: H) -> Self
    where
        H: Fn(Request, Response) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Reply, ApiError>> + Send + 'static,
    {
        let full_path = join_path(&self.prefix, path);
        self.app.handle(method, &full_path, handler);
        self
    }
}

fn join_path(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_end_matches('/');

    if path.is_empty() {
        return if prefix.is_empty() { "/".to_string() } else { prefix.to_string() };
    }

    if path.starts_with('/') {
        format!("{}{}", prefix, path)
    } else {
        format!("{}/{}", prefix, path)
    }
}

fn path_params(params: Result<RawPathParams, RawPathParamsRejection>) -> HashMap<String, String> {
    params
        .map(|params| {
            params
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect()
        })
        .unwrap_or_default()
}

/// Converts the axum request into a framework `Request` and runs the wrapped handler
async fn dispatch(
    handler: Handler,
    timeout: Option<Duration>,
    params: HashMap<String, String>,
    request: axum::extract::Request,
) -> Reply {
    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            warn!(path = %parts.uri.path(), error = %e, "Failed to read request body");
            None
        }
    };

    let context = match timeout {
        Some(timeout) => CallContext::with_timeout(timeout),
        None => CallContext::background(),
    };

    let request = Request::new(parts.method, parts.uri.path())
        .with_params(params)
        .with_headers(parts.headers)
        .with_body(body)
        .with_context(context);

    handler(request).await
}
