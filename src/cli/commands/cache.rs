//! Cache command - inspect the local cache

use crate::cache::{CacheEntry, CacheManager};
use crate::cli::args::{CacheAction, CacheArgs, OutputFormat};
use crate::error::UrResult;
use crate::services::Services;
use crate::ui::{self, UiContext};
use console::style;
use std::sync::Arc;

/// Execute the cache command
pub fn execute(args: CacheArgs, services: &Arc<Services>) -> UrResult<()> {
    match args.action {
        CacheAction::Path => {
            println!("{}", services.cache.root().display());
            Ok(())
        }
        CacheAction::List { format } => list_entries(&services.cache, format),
    }
}

fn list_entries(cache: &CacheManager, format: OutputFormat) -> UrResult<()> {
    let entries = cache.entries()?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        OutputFormat::Text if entries.is_empty() => {
            let ctx = UiContext::detect();
            ui::step_info(
                &ctx,
                &format!("No cached entities under {}", cache.root().display()),
            );
        }
        OutputFormat::Text => print_table(&entries),
    }
    Ok(())
}

fn print_table(entries: &[CacheEntry]) {
    println!(
        "{:<8} {:<48} {:<17} {}",
        style("TYPE").bold(),
        style("KEY").bold(),
        style("MODIFIED").bold(),
        style("FIELDS").bold()
    );
    println!("{}", "-".repeat(90));

    for entry in entries {
        let modified = entry
            .modified
            .map(|m| m.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<8} {:<48} {:<17} {}",
            entry.type_name,
            entry.key,
            style(modified).dim(),
            entry.fields.join(", ")
        );
    }

    println!();
    println!("{} cached entit{}", entries.len(), if entries.len() == 1 { "y" } else { "ies" });
}
