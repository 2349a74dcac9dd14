//! Cross-cutting middleware for the dispatch framework

mod logging;
mod recovery;

pub use crate::api::framework::from_fn;
pub use logging::request_logger;
pub use recovery::recovery;
