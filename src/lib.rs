//! Falcommand configuration resolution library.
//!
//! This module exports the resolution engine for the launcher binary, tests and
//! collaborators that consume the effective configuration.

pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod platform;
