//! Database models and queries

pub mod detections;
pub mod init;
pub mod models;
pub mod users;

pub use init::*;
pub use models::*;
