//! Review aggregation, verification, and moderation for the hospital directory.

pub mod config;
pub mod error;
pub mod reviews;
pub mod telemetry;
