use clap::Parser;
use std::path::PathBuf;

/// Copy the items of one Webflow CMS collection into a Sanity dataset
#[derive(Parser, Debug)]
#[command(name = "wf2sanity", version)]
#[command(about = "Interactively migrate a Webflow collection into Sanity", long_about = None)]
pub struct Cli {
    /// Path to a TOML settings file (defaults to the per-user config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Map items and print the resulting documents without writing to Sanity
    #[arg(long)]
    pub dry_run: bool,
}
