//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// apkinspect -- APK manifest inspection tool.
///
/// Use `apkinspect <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "apkinspect", version, about, long_about = None)]
pub struct Cli {
    /// Path to the apkinspect.toml configuration file.
    #[arg(short, long, default_value = "apkinspect.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
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
    /// Decode an APK and store its manifest metadata.
    Scan(ScanArgs),

    /// List and filter stored scan records.
    Query(QueryArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- scan ----

/// Decode an APK with apktool and extract manifest metadata.
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Path to the APK file.
    pub apk: PathBuf,
}

// ---- query ----

/// Query stored scan records.
///
/// Without arguments, lists every record newest-first. The positional
/// text matches `apk_name` / `sdk_version` substrings; component flags
/// are combined with AND and a record matches when any single component
/// satisfies all of them.
#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Text filter matched against apk name and SDK version.
    #[arg(default_value = "")]
    pub text: String,

    /// Only match records with a component of this type
    /// (activity, service, receiver, provider).
    #[arg(long)]
    pub component_type: Option<String>,

    /// Only match components with this exact exported value
    /// (true, false, not-defined).
    #[arg(long)]
    pub exported: Option<String>,

    /// Only match components whose taskAffinity contains this substring.
    #[arg(long)]
    pub affinity: Option<String>,
}

// ---- config ----

/// Manage apkinspect configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, scanner).
        #[arg(long)]
        section: Option<String>,
    },
}
