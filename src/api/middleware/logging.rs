//! Request logging middleware

use std::time::Instant;

use tracing::{debug, info};

use crate::api::framework::{from_fn, Handler, Middleware, Request};

/// Logs the start and completion of every request with its duration.
///
/// Runs inside `recovery`; a request whose handler panics is reported by
/// `recovery` instead of a completion line.
pub fn request_logger() -> Middleware {
    from_fn(|request: Request, next: Handler| async move {
        let start = Instant::now();
        let method = request.method().clone();
        let path = request.path().to_string();
        let request_id = extract_request_id(&request);

        info!(
            method = %method,
            path = %path,
            request_id = %request_id,
            "Started {} {}",
            method,
            path
        );
        debug!(request_id = %request_id, headers = %redact_headers(&request), "Request headers");

        let reply = next(request).await;

        info!(
            method = %method,
            path = %path,
            status = reply.status().as_u16(),
            duration_ms = start.elapsed().as_millis() as u64,
            request_id = %request_id,
            "Completed {} {}",
            method,
            path
        );

        reply
    })
}

fn extract_request_id(request: &Request) -> String {
    request
        .header("x-request-id")
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

/// Renders the loggable headers, masking credentials
fn redact_headers(request: &Request) -> String {
    let mut parts = Vec::new();

    for (name, value) in request.headers() {
        let name = name.as_str();
        if !should_log_header(name) {
            continue;
        }

        let value = if is_sensitive_header(name) {
            "[REDACTED]"
        } else {
            value.to_str().unwrap_or("[invalid]")
        };
        parts.push(format!("{}={}", name, value));
    }

    parts.join(", ")
}

fn is_sensitive_header(name: &str) -> bool {
    matches!(
        name,
        "authorization" | "cookie" | "proxy-authorization" | "x-api-key"
    )
}

fn should_log_header(name: &str) -> bool {
    matches!(
        name,
        "content-type"
            | "content-length"
            | "accept"
            | "user-agent"
            | "x-request-id"
            | "x-forwarded-for"
            | "authorization"
    )
}
