//! Panic recovery middleware

use std::any::Any;
use std::panic::AssertUnwindSafe;

use axum::http::StatusCode;
use futures::FutureExt;
use tracing::error;

use crate::api::framework::{from_fn, Handler, Middleware, Request, Response};

/// Converts a panic anywhere inside the wrapped chain into a 500 error envelope.
///
/// Must be registered first so it supervises every other layer.
pub fn recovery() -> Middleware {
    from_fn(|request: Request, next: Handler| async move {
        let method = request.method().clone();
        let path = request.path().to_string();

        // The call itself happens inside the guarded future so synchronous panics are caught too
        let outcome = AssertUnwindSafe(async move { next(request).await })
            .catch_unwind()
            .await;

        match outcome {
            Ok(reply) => reply,
            Err(panic) => {
                error!(
                    method = %method,
                    path = %path,
                    panic = %panic_message(&*panic),
                    "Recovered from panic in request handler"
                );
                Response::new().error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
