//! Health check endpoint

use serde::Serialize;

use super::error::ApiError;
use super::framework::{App, Reply, Request, Response};
use crate::domain::storage::BackendKind;

#[derive(Debug, Serialize)]
pub struct HealthData {
    pub status: &'static str,
    pub backend: BackendKind,
    pub version: &'static str,
}

/// Registers `GET /health`, reporting the backend selected at startup
pub fn register_health_routes(app: &mut App, backend: BackendKind) {
    app.route("/health")
        .get("", move |req, res| health_check(backend, req, res));
}

/// Liveness only; does not touch storage
pub async fn health_check(
    backend: BackendKind,
    _req: Request,
    res: Response,
) -> Result<Reply, ApiError> {
    let data = HealthData {
        status: "healthy",
        backend,
        version: env!("CARGO_PKG_VERSION"),
    };

    Ok(res.success("Service is healthy", data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Method, StatusCode};

    #[tokio::test]
    async fn test_health_check() {
        let reply = health_check(
            BackendKind::Postgres,
            Request::new(Method::GET, "/health"),
            Response::new(),
        )
        .await
        .unwrap();

        assert_eq!(reply.status(), StatusCode::OK);
        assert_eq!(reply.body()["message"], "Service is healthy");
        assert_eq!(reply.body()["data"]["status"], "healthy");
        assert_eq!(reply.body()["data"]["backend"], "relational-networked-postgres-like");
        assert_eq!(reply.body()["data"]["version"], env!("CARGO_PKG_VERSION"));
    }
}
