//! CLI command implementations

pub mod cache;
pub mod cat;
pub mod completions;
pub mod config;
pub mod ls;
pub mod resolve;

pub use cache::execute as cache;
pub use cat::execute as cat;
pub use completions::execute as completions;
pub use config::execute as config;
pub use ls::execute as ls;
pub use resolve::execute as resolve;

use crate::error::UrResult;
use crate::identifier::{Identifier, Resolved};
use crate::services::Services;
use crate::ui::{TaskSpinner, UiContext};
use std::sync::Arc;

/// Resolve `input`, showing a spinner while remote repositories are
/// cloned or pulled
pub(crate) fn resolve_with_progress(
    ctx: &UiContext,
    services: &Arc<Services>,
    input: &str,
) -> UrResult<Resolved> {
    let identifier = Identifier::parse(input)?;
    if matches!(identifier, Identifier::Local(_)) {
        return identifier.resolve(services, false);
    }

    let mut spinner = TaskSpinner::new(ctx);
    spinner.start(&format!("Resolving {}", input));
    match identifier.resolve(services, false) {
        Ok(resolved) => {
            spinner.clear();
            Ok(resolved)
        }
        Err(e) => {
            spinner.stop_error(&format!("Could not resolve {}", input));
            Err(e)
        }
    }
}
