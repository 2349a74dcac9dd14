//! Storage infrastructure - one adapter per engine plus the backend selector

mod factory;
mod mongodb;
mod mysql;
mod postgres;
mod rows;
mod sql_error;
mod sqlite;

pub use factory::StorageFactory;
pub use mongodb::{MongoConfig, MongoUserStorage};
pub use mysql::{MySqlConfig, MySqlUserStorage};
pub use postgres::{PostgresConfig, PostgresUserStorage};
pub use sqlite::{SqliteUserStorage, MEMORY_PATH};
