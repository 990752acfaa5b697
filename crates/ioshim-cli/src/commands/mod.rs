//! CLI command implementations.

pub mod config;
pub mod read;
pub mod version;
