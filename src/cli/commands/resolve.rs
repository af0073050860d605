//! Resolve command - show what an identifier points at

use super::resolve_with_progress;
use crate::cache::Entity;
use crate::cli::args::{OutputFormat, ResolveArgs};
use crate::error::UrResult;
use crate::identifier::Resolved;
use crate::provider::{Commit, Target};
use crate::services::Services;
use crate::tree::ContentNode;
use crate::ui::{self, UiContext};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Default, Serialize)]
struct Summary {
    kind: &'static str,
    url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    repo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    commit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    module: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    raw_url: Option<String>,
}

/// Execute the resolve command
pub fn execute(args: ResolveArgs, services: &Arc<Services>) -> UrResult<()> {
    let ctx = UiContext::detect();
    let resolved = resolve_with_progress(&ctx, services, &args.identifier)?;
    let summary = summarize(&resolved)?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Text => print_summary(&ctx, &summary),
    }
    Ok(())
}

fn node_kind(node: &ContentNode) -> &'static str {
    if node.is_dir() {
        "directory"
    } else {
        "file"
    }
}

fn commit_summary(commit: &Arc<Commit>) -> UrResult<Summary> {
    let repo = commit.repo();
    Ok(Summary {
        kind: "commit",
        url: commit.www_url(),
        provider: Some(repo.provider().to_string()),
        repo: Some(repo.id().to_string()),
        commit: Some(commit.sha().to_string()),
        author: Some(commit.get(&Commit::AUTHOR)?),
        module: Some(repo.module_name()),
        ..Summary::default()
    })
}

fn summarize(resolved: &Resolved) -> UrResult<Summary> {
    match resolved {
        Resolved::Local(node) => Ok(Summary {
            kind: node_kind(node),
            url: node.url().to_string(),
            ..Summary::default()
        }),
        Resolved::Remote(Target::Commit(commit)) => commit_summary(commit),
        Resolved::Remote(Target::File(file)) => {
            let mut summary = commit_summary(file.commit())?;
            summary.kind = node_kind(file.node());
            summary.path = Some(file.path().to_string());
            if file.node().is_file() {
                summary.url = file.www_url()?;
                summary.module = Some(file.module_fullname());
                summary.raw_url = Some(file.raw_url()?);
            } else {
                summary.url = file.node().url().to_string();
            }
            Ok(summary)
        }
    }
}

fn print_summary(ctx: &UiContext, summary: &Summary) {
    ui::intro(ctx, &summary.url);
    ui::key_value(ctx, "kind", summary.kind);

    let rows = [
        ("provider", &summary.provider),
        ("repo", &summary.repo),
        ("commit", &summary.commit),
        ("author", &summary.author),
        ("path", &summary.path),
        ("module", &summary.module),
        ("raw", &summary.raw_url),
    ];
    for (key, value) in rows {
        if let Some(value) = value {
            ui::key_value(ctx, key, value);
        }
    }
}
