//! mqgo - generate and run API test plans
//!
//! `generate` submits a Swagger/OpenAPI spec to the generation service and
//! stores the annotated spec and test plans it returns in a workspace
//! directory. `run` executes the suites of a test plan against the API and
//! writes a result document.

pub mod cli;
pub mod commands;
pub mod common;
pub mod generate;
pub mod testing;

// Re-export commonly used types for tests
pub use common::{Error, Result};
