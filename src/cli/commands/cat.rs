//! Cat command - print file contents

use super::resolve_with_progress;
use crate::cli::args::CatArgs;
use crate::error::{UrError, UrResult};
use crate::services::Services;
use crate::ui::UiContext;
use std::io::{self, Write};
use std::sync::Arc;

/// Execute the cat command
pub fn execute(args: CatArgs, services: &Arc<Services>) -> UrResult<()> {
    let ctx = UiContext::detect();
    let node = resolve_with_progress(&ctx, services, &args.identifier)?.node();
    let bytes = node.read()?;

    let mut stdout = io::stdout().lock();
    stdout
        .write_all(&bytes)
        .and_then(|()| stdout.flush())
        .map_err(|e| UrError::io("writing to stdout", e))
}
