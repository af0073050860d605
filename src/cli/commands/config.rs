//! Config command - show or initialize configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager};
use crate::error::UrResult;
use crate::ui::{self, UiContext};

/// Execute the config command
pub fn execute(args: ConfigArgs, config: &Config, manager: &ConfigManager) -> UrResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => println!("{}", manager.path().display()),
        Some(ConfigAction::Init { force }) => init_config(manager, force)?,
    }
    Ok(())
}

/// Print the effective configuration; tokens are masked
fn show_config(config: &Config) -> UrResult<()> {
    let mut shown = config.clone();
    for token in [&mut shown.auth.github_token, &mut shown.auth.gitlab_token] {
        if token.is_some() {
            *token = Some("********".to_string());
        }
    }
    println!("{}", toml::to_string_pretty(&shown)?);
    Ok(())
}

fn init_config(manager: &ConfigManager, force: bool) -> UrResult<()> {
    let ctx = UiContext::detect();
    let path = manager.path();

    if path.exists() && !force {
        ui::step_warn_hint(
            &ctx,
            &format!("Config already exists at {}", path.display()),
            "Use --force to overwrite",
        );
        return Ok(());
    }

    manager.save(&Config::default())?;
    ui::step_ok_detail(&ctx, "Configuration initialized", &path.display().to_string());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn init_writes_defaults_once() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("ur/config.toml"));

        init_config(&manager, false).unwrap();
        assert!(manager.path().exists());

        let mut custom = Config::default();
        custom.cache.skip = true;
        manager.save(&custom).unwrap();

        init_config(&manager, false).unwrap();
        assert!(manager.load().unwrap().cache.skip);

        init_config(&manager, true).unwrap();
        assert!(!manager.load().unwrap().cache.skip);
    }
}
