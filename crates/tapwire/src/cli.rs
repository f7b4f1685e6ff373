//! Command line interface definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Tapwire: decode database wire-traffic recordings.
#[derive(Parser)]
#[command(name = "tapwire")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Convert a recording into a replay file.
    Export(ExportArgs),
    /// Print a summary of each packet in a recording.
    Inspect(InspectArgs),
    /// Print version information.
    Version,
}

/// Arguments for the export command.
#[derive(Args)]
pub struct ExportArgs {
    /// Recording file produced by the traffic recorder.
    pub input: PathBuf,

    /// Replay file to write.
    pub output: PathBuf,
}

/// Arguments for the inspect command.
#[derive(Args)]
pub struct InspectArgs {
    /// Recording file produced by the traffic recorder.
    pub input: PathBuf,
}
