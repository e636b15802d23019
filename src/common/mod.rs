//! Common utilities shared by the generate and run commands

pub mod config;
pub mod error;
pub mod logging;
pub mod paths;

pub use config::WorkspaceConfig;
pub use error::{Error, Result};
