//! Infrastructure layer - storage engines and process-level services

pub mod logging;
pub mod storage;
