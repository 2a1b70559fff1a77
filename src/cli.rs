//! CLI argument parsing for the pflog launcher

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pflog")]
#[command(version)]
#[command(
    about = "Run a command with the output of selected programs discarded",
    long_about = None
)]
pub struct Cli {
    /// Discard both stdout and stderr of this program (repeatable)
    #[arg(short = 'f', long = "filter", value_name = "NAME")]
    pub filter: Vec<String>,

    /// Discard only stdout of this program (repeatable)
    #[arg(long = "stdout", value_name = "NAME")]
    pub stdout: Vec<String>,

    /// Discard only stderr of this program (repeatable)
    #[arg(long = "stderr", value_name = "NAME")]
    pub stderr: Vec<String>,

    /// Preload library to inject (default: libpflog_preload next to this executable)
    #[arg(long = "library", value_name = "PATH", env = "PFLOG_LIBRARY")]
    pub library: Option<PathBuf>,

    /// Enable debug output for the launcher and the injected library
    #[arg(long)]
    pub debug: bool,

    /// Command to run (everything after --)
    #[arg(last = true, required = true)]
    pub command: Vec<String>,
}
