//! texmill CLI library.
//!
//! Command implementations and logging setup for the `texmill` binary.

pub mod commands;
pub mod input;
pub mod logging;
