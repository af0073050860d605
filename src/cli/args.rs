//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

/// ur - address files in gists, GitHub and GitLab repositories
///
/// Clones repositories on demand into a local cache and exposes their
/// files by URL, prefixed id or dotted module path.
#[derive(Parser, Debug)]
#[command(name = "ur")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "UR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Cache directory (defaults to .objs in the current directory)
    #[arg(long, global = true, env = "UR_CACHE_ROOT")]
    pub cache_root: Option<PathBuf>,

    /// Recompute fields and re-fetch downloads instead of reading the cache
    #[arg(long, global = true)]
    pub skip_cache: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show what an identifier points at
    Resolve(ResolveArgs),

    /// List a directory (or a whole commit)
    Ls(LsArgs),

    /// Print a file's contents
    Cat(CatArgs),

    /// Inspect the local cache
    Cache(CacheArgs),

    /// Show or initialize configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the resolve command
#[derive(Parser, Debug)]
pub struct ResolveArgs {
    /// URL, `github:org/repo[@commit][:path]`, dotted module path or local path
    pub identifier: String,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the ls command
#[derive(Parser, Debug)]
pub struct LsArgs {
    /// Directory identifier
    pub identifier: String,

    /// List descendants, honoring .urignore files
    #[arg(short, long)]
    pub recursive: bool,

    /// Include .git and ignored entries
    #[arg(short, long)]
    pub all: bool,
}

/// Arguments for the cat command
#[derive(Parser, Debug)]
pub struct CatArgs {
    /// File identifier
    pub identifier: String,
}

/// Arguments for the cache command
#[derive(Parser, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub action: CacheAction,
}

#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Print the cache root
    Path,

    /// List cached entities and their fields
    List {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write a default configuration file
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Arguments for the completions command
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: Shell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable
    Text,
    /// JSON
    Json,
}
