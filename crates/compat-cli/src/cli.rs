//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::Parser;

/// Extension Compatibility Analyzer - classify extension packages against
/// a base installation
#[derive(Parser, Debug)]
#[command(name = "extcompat")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory containing extension archives (.vsix or .zip)
    pub extensions_dir: PathBuf,

    /// Directory containing the base installation's archives
    pub base_install_dir: PathBuf,

    /// Fail manifest parsing when a required field is missing, instead of
    /// recording a warning
    #[arg(long)]
    pub strict: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}
