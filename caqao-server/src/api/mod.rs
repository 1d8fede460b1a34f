//! HTTP API handlers for caqao-server

pub mod assess;
pub mod health;
pub mod records;

pub use assess::assess;
pub use health::{health_routes, serve_index};
pub use records::{get_image, list_detections, save_results};
