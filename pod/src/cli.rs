use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "pod",
    about = "Create, inspect and extract pod archives.",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(visible_alias = "c", about = "Create a new archive")]
    Create(CreateArgs),

    #[command(visible_alias = "x", about = "Extract entries from an archive")]
    Extract(ExtractArgs),

    #[command(visible_aliases = ["l", "ls"], about = "List entries in an archive")]
    List(ListArgs),

    #[command(about = "Show archive metadata")]
    Info(InfoArgs),
}

#[derive(Debug, clap::Args)]
pub struct CreateArgs {
    /// Output archive path
    pub archive: PathBuf,

    /// Overwrite existing archive
    #[arg(short = 'f', long)]
    pub force: bool,

    /// Files and directories to archive
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}

#[derive(Debug, clap::Args)]
pub struct ExtractArgs {
    /// Archive to extract
    pub archive: PathBuf,

    /// Destination directory
    #[arg(short = 'o', long, default_value = ".")]
    pub output: PathBuf,

    /// Only extract entries under this archive path
    #[arg(short = 'p', long)]
    pub prefix: Option<String>,
}

#[derive(Debug, clap::Args)]
pub struct ListArgs {
    /// Archive to list
    pub archive: PathBuf,

    /// Machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, clap::Args)]
pub struct InfoArgs {
    /// Archive to inspect
    pub archive: PathBuf,
}
