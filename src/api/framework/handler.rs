//! Handler and middleware types plus the terminal-handler adapter

use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use tracing::error;

use super::request::Request;
use super::response::{Reply, Response};
use crate::api::error::ApiError;

/// A request handler after adaptation, the unit middleware wraps
pub type Handler = Arc<dyn Fn(Request) -> BoxFuture<'static, Reply> + Send + Sync>;

/// A transform from an inner handler to a wrapped handler
pub type Middleware = Arc<dyn Fn(Handler) -> Handler + Send + Sync>;

/// Builds a middleware from an async function receiving the request and the next handler
pub fn from_fn<F, Fut>(f: F) -> Middleware
where
    F: Fn(Request, Handler) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Reply> + Send + 'static,
{
    let f = Arc::new(f);

    Arc::new(move |next: Handler| -> Handler {
        let f = Arc::clone(&f);
        Arc::new(move |request: Request| -> BoxFuture<'static, Reply> {
            f(request, Arc::clone(&next)).boxed()
        })
    })
}

/// Adapts a terminal handler into a [`Handler`].
///
/// `Err` results become the error envelope; the hidden cause of server errors is
/// logged here since it never reaches the client.
pub fn terminal<H, Fut>(handler: H) -> Handler
where
    H: Fn(Request, Response) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Reply, ApiError>> + Send + 'static,
{
    Arc::new(move |request: Request| -> BoxFuture<'static, Reply> {
        let method = request.method().clone();
        let path = request.path().to_string();
        let fut = handler(request, Response::new());

        async move {
            match fut.await {
                Ok(reply) => reply,
                Err(err) => {
                    if err.status().is_server_error() {
                        error!(
                            method = %method,
                            path = %path,
                            status = err.status().as_u16(),
                            cause = err.cause().unwrap_or("none"),
                            "{}",
                            err.message()
                        );
                    }
                    err.into_reply()
                }
            }
        }
        .boxed()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Method, StatusCode};

    #[tokio::test]
    async fn test_terminal_converts_errors() {
        let handler = terminal(|_req, _res| async { Err(ApiError::not_found("User not found")) });

        let reply = handler(Request::new(Method::GET, "/users/1")).await;
        assert_eq!(reply.status(), StatusCode::NOT_FOUND);
        assert_eq!(reply.body()["error"], "User not found");
    }

    #[tokio::test]
    async fn test_from_fn_can_short_circuit() {
        let deny = from_fn(|_req, _next| async {
            Response::new().error(StatusCode::BAD_REQUEST, "denied")
        });
        let inner = terminal(|_req, res: Response| async move { Ok(res.success("ok", ())) });

        let reply = deny(inner)(Request::new(Method::GET, "/")).await;
        assert_eq!(reply.status(), StatusCode::BAD_REQUEST);
    }
}
