//! ur - resolve and read files in gists, GitHub and GitLab repositories
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use ur::cli::{commands, Cli, Commands};
use ur::config::{ConfigManager, GeneralConfig};
use ur::error::UrResult;
use ur::services::Services;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

/// 0 = warn, 1 = info, 2+ = debug; `UR_DEBUG` forces debug
fn init_logging(verbose: u8, general: &GeneralConfig) {
    let level = if std::env::var_os("UR_DEBUG").is_some() {
        2
    } else if general.verbose {
        verbose.max(1)
    } else {
        verbose
    };
    let filter = match level {
        0 => EnvFilter::new("ur=warn"),
        1 => EnvFilter::new("ur=info"),
        _ => EnvFilter::new("ur=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if general.log_format == "json" {
        builder.json().init();
    } else {
        builder.without_time().init();
    }
}

fn run() -> UrResult<()> {
    let cli = Cli::parse();

    // Completions need neither config nor cache
    if let Commands::Completions(args) = cli.command {
        return commands::completions(args);
    }

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = config_manager.load()?;

    init_logging(cli.verbose, &config.general);
    ur::ui::init_theme();
    debug!("Config: {}", config_manager.path().display());

    let services = Services::from_config(&config, cli.cache_root, cli.skip_cache);
    debug!("Cache root: {}", services.cache.root().display());

    let result = match cli.command {
        Commands::Completions(_) => unreachable!("Completions handled above"),
        Commands::Resolve(args) => commands::resolve(args, &services),
        Commands::Ls(args) => commands::ls(args, &services),
        Commands::Cat(args) => commands::cat(args, &services),
        Commands::Cache(args) => commands::cache(args, &services),
        Commands::Config(args) => commands::config(args, &config, &config_manager),
    };

    services.flush();
    result
}
