use std::num::NonZeroUsize;

use clap::{Args, Parser, Subcommand};

use crate::model::config::OrphanPolicy;

#[derive(Parser)]
#[command(name = "nbt", about = concat!("nbt v", env!("CARGO_PKG_VERSION"), " - notebook trees from flat collections"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Collection to read: a file, `-` for stdin, or an http(s) URL
    #[arg(short, long, global = true)]
    pub source: Option<String>,

    /// Config file (default: ./nbtree.toml, then the user config)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// How to handle records whose parent is missing (overrides config)
    #[arg(long, global = true, value_enum)]
    pub orphans: Option<OrphanPolicy>,

    /// Use Bootstrap-Treeview key names (text/nodes) in JSON output
    #[arg(long, global = true)]
    pub treeview: bool,

    /// More log output on stderr (repeatable)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the notebook tree
    Tree(TreeArgs),
    /// Validate the collection (dangling parents, duplicates, cycles)
    Check,
    /// List the notebooks directly inside a notebook
    Ls(LsArgs),
    /// Show the breadcrumb path to a notebook
    Path(PathArgs),
    /// Search notebook names by regex
    Find(FindArgs),
}

#[derive(Args)]
pub struct TreeArgs {
    /// Only show this many levels, at least 1 (text output only)
    #[arg(long)]
    pub levels: Option<NonZeroUsize>,
}

#[derive(Args)]
pub struct LsArgs {
    /// Notebook ID (default: top level)
    pub id: Option<String>,
}

#[derive(Args)]
pub struct PathArgs {
    /// Notebook ID
    pub id: String,
}

#[derive(Args)]
pub struct FindArgs {
    /// Regex pattern matched against notebook names
    pub pattern: String,
}
