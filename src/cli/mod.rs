//! CLI command definitions for falcommand-config
//!
//! The main entry point is the `Cli` struct; `resolve` runs when no
//! subcommand is given.

use crate::config::Scope;
use crate::platform::{BuildMode, PlatformTag};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Resolve, validate and back up Falcommand launcher configuration
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory holding config*.json (overrides FALCOMMAND_CONFIG_DIR)
    #[arg(long, global = true, value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    /// Backup ring directory (overrides FALCOMMAND_BACKUP_DIR)
    #[arg(long, global = true, value_name = "DIR")]
    pub backup_dir: Option<PathBuf>,

    /// Platform to resolve for (default: FALCOMMAND_PLATFORM or detected)
    #[arg(long, global = true)]
    pub platform: Option<PlatformTag>,

    /// Build mode; debug enables config.debug*.json (default: this binary's)
    #[arg(long, global = true)]
    pub build_mode: Option<BuildMode>,

    /// Output format: json, yaml or text
    #[arg(short, long, default_value = "json", global = true)]
    pub format: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the effective configuration and any validation issues (default)
    Resolve,

    /// List configuration files that contribute, lowest rank first
    Sources,

    /// Resolve and exit non-zero if the configuration has validation issues
    Validate,

    /// List stored backups, oldest first
    Backups,

    /// Print a backed-up configuration
    Restore(RestoreArgs),

    /// Write a partial configuration document to a scope's file
    Set(SetArgs),

    /// Create config.json with the built-in defaults if it does not exist
    Init,
}

/// Arguments for the restore subcommand
#[derive(Args, Debug)]
pub struct RestoreArgs {
    /// Backup sequence number (see `backups`)
    pub sequence: u64,

    /// Also persist the snapshot as the user config.json
    #[arg(long)]
    pub apply: bool,
}

/// Arguments for the set subcommand
#[derive(Args, Debug)]
pub struct SetArgs {
    /// Target scope: user or local
    pub scope: Scope,

    /// Write the file tagged with this platform instead of the shared one
    #[arg(long, value_name = "PLATFORM")]
    pub tag: Option<PlatformTag>,

    /// JSON document to write (`-` for stdin)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}
