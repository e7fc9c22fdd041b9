//! Process-level plumbing shared by the issue tracker binaries:
//! layered configuration, logging and shutdown signals.

pub mod config;
pub mod logging;
pub mod paths;
pub mod shutdown;

pub use config::{AppConfig, CliArgs, LoggingConfig, Section, ServerConfig};
