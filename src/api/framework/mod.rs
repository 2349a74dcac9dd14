//! Minimal dispatch framework on top of axum
//!
//! Routes are registered on an [`App`] together with an ordered list of
//! [`Middleware`]. Each route captures the middleware registered before it, the
//! first-registered middleware being the outermost wrapper. [`App::into_router`]
//! finalises the table into an axum `Router`; nothing can be registered after that.

mod app;
mod handler;
mod request;
mod response;

pub use app::{App, HttpMethod, RouteGroup, MAX_BODY_BYTES};
pub use handler::{from_fn, terminal, Handler, Middleware};
pub use request::Request;
pub use response::{ErrorEnvelope, Reply, Response, SuccessEnvelope};
