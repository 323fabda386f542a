//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O, apart from resolving the
//! default configuration path from the environment.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use tunerlink_core::config::default_config_path;

/// Tunerlink -- tuner hardware linkage validation and dataflow inspection.
///
/// Use `tunerlink <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "tunerlink", version, about, long_about = None)]
pub struct Cli {
    /// Path to the tuner configuration file.
    ///
    /// Defaults to {TUNERLINK_CONFIG_DIR or /vendor/etc}/tuner_vts_config_aidl_V1.toml,
    /// with `.<variant>` inserted when TUNERLINK_CONFIG_VARIANT is set.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Configuration file path: the `--config` flag, else the device default.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(default_config_path)
    }
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table / text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load the configuration and validate every declared connection.
    Validate,

    /// Show the resource chain determined for each dataflow context.
    Dataflows(DataflowsArgs),

    /// Decode a filter main-type bit position or capability mask.
    FilterType(FilterTypeArgs),

    /// Inspect configuration.
    Config(ConfigArgs),
}

// ---- dataflows ----

/// Show determined dataflows.
#[derive(Args, Debug)]
pub struct DataflowsArgs {
    /// Show only one context (record, record_with_lnb, descrambling, descrambling_with_lnb).
    #[arg(long)]
    pub context: Option<String>,

    /// Override the tie-break policy (first_declared, last_declared).
    #[arg(long)]
    pub selection: Option<String>,
}

// ---- filter-type ----

/// Decode filter main types.
#[derive(Args, Debug)]
pub struct FilterTypeArgs {
    /// Bit position of the main type (0 = TS, 1 = MMTP, 2 = IP, 3 = TLV, 4 = ALP).
    #[arg(required_unless_present = "mask", conflicts_with = "mask")]
    pub bit: Option<u32>,

    /// Capability bitmask; decimal or 0x-prefixed hex. Every set bit is decoded.
    #[arg(long)]
    pub mask: Option<String>,
}

// ---- config ----

/// Inspect tunerlink configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, dataflow, frontends, demuxes,
        /// filters, dvrs, lnbs, descramblers, time_filters, diseqc_messages, connections).
        #[arg(long)]
        section: Option<String>,
    },
    /// Print the configuration path that would be loaded.
    Path,
}
