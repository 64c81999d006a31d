//! Logging utilities.
//!
//! The engine only talks to the `log` facade; this module wires up the
//! `env_logger` backend for hosts that do not bring their own.

mod init;

pub use init::{init_logging, LoggingConfig};
