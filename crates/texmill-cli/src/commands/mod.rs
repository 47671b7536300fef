//! CLI command implementations

pub mod build;
pub mod doctor;
pub mod extract_log;
pub mod render;
