use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// CLI surface definition.
#[derive(Parser, Debug)]
#[command(
    name = "sdr",
    about = "Secure data replacement: keep data only in transformed form",
    version,
    propagate_version = true
)]
pub struct Cli {
    /// Override the SDR location (directory holding persisted records).
    #[arg(long, global = true)]
    pub location: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print version and exit.
    Version,
    /// Write, read back and remove a probe record at the SDR location.
    Health,
    /// Manage CLI configuration.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Work with records at the SDR location.
    #[command(subcommand)]
    Record(RecordCommand),
    /// Conceal a file (writes `<file>.sdr`) or a text value (prints base64).
    Conceal(TransformArgs),
    /// Reveal a concealed file (writes `<file>.clear`) or base64 text.
    Reveal(TransformArgs),
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigCommand {
    /// Create a default config file if one does not exist.
    Init,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum RecordCommand {
    /// Store a value under a key.
    Put { key: String, value: String },
    /// Print the value stored under a key.
    Get { key: String },
    /// Remove a key (no error if it is absent).
    Rm { key: String },
    /// List stored keys.
    Ls,
    /// Remove every record and the SDR location itself.
    Wipe,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct TransformArgs {
    /// File to process.
    #[arg(required_unless_present = "text", conflicts_with = "text")]
    pub file: Option<PathBuf>,
    /// Process this value instead of a file.
    #[arg(long)]
    pub text: Option<String>,
    /// Security string shared by concealer and revealer (falls back to SDR_SECURITY).
    #[arg(long)]
    pub security: Option<String>,
}
