//! Terminal output for the `ur` binary
//!
//! Interactive terminals get `cliclack` styling; pipes and CI get plain
//! lines. Status chatter goes to stderr so `ur cat` and `ur ls` output
//! stays clean on stdout.
//!
//! ```rust,ignore
//! let ctx = UiContext::detect();
//! let mut spinner = TaskSpinner::new(&ctx);
//! spinner.start("Resolving github:org/repo");
//! let resolved = identifier::resolve(&services, input, false)?;
//! spinner.clear();
//! ui::key_value(&ctx, "commit", resolved_sha);
//! ```

mod context;
mod output;
mod progress;
mod theme;

pub use context::UiContext;
pub use output::{intro, key_value, step_info, step_ok_detail, step_warn_hint};
pub use progress::TaskSpinner;
pub use theme::{init_theme, UrTheme};
