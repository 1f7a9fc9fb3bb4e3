use clap::{Parser, Subcommand};

/// Command line arguments for jsonext
///
/// Global flags (`--config`, `--quiet`, `--debug`, `--output`, `--json`) are
/// added to this parser by the application and its extensions at setup.
#[derive(Parser, Debug)]
#[command(
    name = "jsonext",
    version = env!("CARGO_PKG_VERSION"),
    about = "Inspect layered JSON configuration and render it as text, table or JSON",
    long_about = "Loads JSON configuration files into a sectioned store and renders it through pluggable output handlers. Pass --json for machine-readable output."
)]
pub struct Args {
    /// Command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show the merged configuration
    Show,
    /// List configuration sections
    Sections,
    /// Show a single configuration value
    Get {
        /// Section name
        section: String,
        /// Key within the section
        key: String,
    },
    /// Set a value for this invocation and show the resulting section
    Set {
        /// Section name
        section: String,
        /// Key within the section
        key: String,
        /// New value
        value: String,
    },
    /// List registered output handlers and config decoders
    Handlers,
}
