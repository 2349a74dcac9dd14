//! User store API
//!
//! A REST service for user records with swappable persistence backends:
//! - One storage contract implemented for SQLite, MySQL, PostgreSQL and MongoDB
//! - Configuration-driven backend selection with opt-in startup fallback
//! - A small dispatch framework with ordered middleware and panic recovery

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;
