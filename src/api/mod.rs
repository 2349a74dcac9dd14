//! HTTP API layer - dispatch framework, middleware and the user resource

pub mod error;
pub mod framework;
pub mod health;
pub mod middleware;
pub mod router;
pub mod users;

pub use error::{ApiError, ApiErrorKind};
pub use router::{build_app, create_router};
