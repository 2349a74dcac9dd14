//! Application assembly: middleware order and route registration

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower_http::trace::TraceLayer;

use super::framework::App;
use super::health::register_health_routes;
use super::middleware::{recovery, request_logger};
use super::users::register_user_routes;
use crate::domain::storage::UserStorage;

/// Assembles the application: recovery outermost, then request logging, then routes
pub fn build_app(storage: Arc<dyn UserStorage>, request_timeout: Option<Duration>) -> App {
    let mut app = App::new().with_request_timeout(request_timeout);

    app.use_middleware(recovery());
    app.use_middleware(request_logger());

    register_health_routes(&mut app, storage.backend());
    register_user_routes(&mut app, storage);

    app
}

/// Create the full router for serving
pub fn create_router(storage: Arc<dyn UserStorage>, request_timeout: Option<Duration>) -> Router {
    build_app(storage, request_timeout)
        .into_router()
        .layer(TraceLayer::new_for_http())
}
