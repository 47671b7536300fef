//! texmill End-to-End Test Infrastructure
//!
//! This crate provides integration tests for the PDF production flow:
//!
//! - Produce: document -> materialized media -> engine passes -> PDF bytes
//! - Failure reporting: engine log -> diagnostic excerpt
//! - Cleanup: the working directory is gone after every call
//!
//! Most tests run against shell scripts that stand in for the TeX engine, so
//! no TeX installation is needed.
//!
//! ## Running Tests
//!
//! ```bash
//! # Run all tests against fake engines
//! cargo test -p texmill-tests
//!
//! # Also run tests against a real pdflatex
//! TEXMILL_RUN_TEX_TESTS=1 cargo test -p texmill-tests -- --ignored
//! ```

pub mod harness;
