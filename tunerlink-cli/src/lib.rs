//! Tunerlink CLI library surface
//!
//! Exposes argument parsing, command handlers and output rendering so the
//! binary stays a thin wrapper and integration tests can drive commands directly.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod output;
