//! # CAQAO Common Library
//!
//! Shared code for the CAQAO assessment service:
//! - Bean category vocabulary, label normalization and grading
//! - Database schema, models and queries
//! - Bootstrap configuration loading
//! - Common error type

pub mod config;
pub mod db;
pub mod error;
pub mod grading;

pub use error::{Error, Result};
pub use grading::{Category, DetectionTally, GradeCode};
