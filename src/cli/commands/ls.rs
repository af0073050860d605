//! Ls command - list directory entries

use super::resolve_with_progress;
use crate::cli::args::LsArgs;
use crate::error::UrResult;
use crate::services::Services;
use crate::tree::{walk, ContentNode};
use crate::ui::UiContext;
use std::sync::Arc;

/// Execute the ls command
pub fn execute(args: LsArgs, services: &Arc<Services>) -> UrResult<()> {
    let ctx = UiContext::detect();
    let node = resolve_with_progress(&ctx, services, &args.identifier)?.node();

    for line in listing(&node, args.recursive, args.all)? {
        println!("{}", line);
    }
    Ok(())
}

/// Entry names (relative paths when recursive); directories end in `/`
fn listing(node: &ContentNode, recursive: bool, all: bool) -> UrResult<Vec<String>> {
    if node.is_file() {
        return Ok(vec![node.name().to_string()]);
    }

    let entries: Vec<(String, ContentNode)> = if recursive {
        let root = node.url();
        walk(node, all)?
            .into_iter()
            .map(|child| {
                let rel = child
                    .url()
                    .strip_prefix(root)
                    .unwrap_or(child.url())
                    .trim_start_matches('/')
                    .to_string();
                (rel, child)
            })
            .collect()
    } else {
        node.children()?
            .into_iter()
            .filter(|(name, _)| all || name != ".git")
            .collect()
    };

    Ok(entries
        .into_iter()
        .map(|(name, child)| {
            if child.is_dir() {
                format!("{}/", name)
            } else {
                name
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::write_files;
    use tempfile::TempDir;

    #[test]
    fn flat_and_recursive() {
        let dir = TempDir::new().unwrap();
        write_files(
            dir.path(),
            &[
                (".urignore", "*.log\n"),
                ("a.py", ""),
                ("pkg/b.py", ""),
                ("pkg/out.log", ""),
                (".git/HEAD", ""),
            ],
        );
        let root = ContentNode::path(dir.path());

        assert_eq!(
            listing(&root, false, false).unwrap(),
            vec![".urignore", "a.py", "pkg/"]
        );
        assert_eq!(
            listing(&root, false, true).unwrap(),
            vec![".git/", ".urignore", "a.py", "pkg/"]
        );
        assert_eq!(
            listing(&root, true, false).unwrap(),
            vec![".urignore", "a.py", "pkg/", "pkg/b.py"]
        );
        assert!(listing(&root, true, true)
            .unwrap()
            .contains(&"pkg/out.log".to_string()));
    }

    #[test]
    fn file_lists_itself() {
        let dir = TempDir::new().unwrap();
        write_files(dir.path(), &[("a.py", "")]);
        let node = ContentNode::path(dir.path().join("a.py"));
        assert_eq!(listing(&node, true, false).unwrap(), vec!["a.py"]);
    }
}
