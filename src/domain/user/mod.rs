//! User domain
//!
//! The single resource managed by the service: the stored `User` record, its
//! identifier, and the validated `UserDraft` accepted from callers.

mod entity;
mod validation;

pub use entity::{timestamp_now, User, UserId};
pub use validation::UserDraft;
