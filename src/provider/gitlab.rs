//! GitLab URL grammar
//!
//! ```text
//! gitlab.com/<group>[/<subgroup>...]/<project>[/-/tree/<commit>[/<path>]]
//! gitlab.com/<group>[/<subgroup>...]/<project>/-/blob/<commit>/<path>
//! gitlab.com/<group>[/<subgroup>...]/<project>/-/raw/<commit>/<path>
//! ```
//!
//! Group and project names cannot be `-`, which is what separates the
//! project path from the view.

use crate::error::UrResult;
use crate::provider::pattern::{maybe, select, Captures, Grammar, UrlPattern, RAW};
use crate::provider::{Provider, UrlAttrs};
use std::sync::LazyLock;

const SEGMENT: &str = r"[A-Za-z0-9_][A-Za-z0-9_\-\.]*";
const COMMIT: &str = r"(?P<commit>[a-f0-9]+)";
const PATH: &str = r"(?P<path>[A-Za-z0-9_\-\./ ]+)";

fn project() -> String {
    format!("(?P<id>{SEGMENT}(?:/{SEGMENT})+)")
}

static GRAMMAR: LazyLock<Grammar> = LazyLock::new(|| {
    let project = project();
    Ok(vec![
        UrlPattern::new(
            "tree",
            format!(
                "^/{project}{}/?$",
                maybe(&format!("/-/tree/{COMMIT}{}", maybe(&format!("/{PATH}"))))
            ),
        )?,
        UrlPattern::new("blob", format!("^/{project}/-/blob/{COMMIT}/{PATH}$"))?,
        UrlPattern::new(RAW, format!("^/{project}/-/raw/{COMMIT}/{PATH}$"))?,
    ])
});

pub fn patterns(raw: Option<bool>) -> UrResult<Vec<&'static UrlPattern>> {
    select(&GRAMMAR, raw)
}

pub(super) fn attrs(pattern: &str, caps: &Captures) -> UrlAttrs {
    let id = caps["id"].trim_end_matches(".git");
    let mut attrs = UrlAttrs::new(Provider::Gitlab, id);
    attrs.commit = caps.get("commit").cloned();
    attrs.path = caps.get("path").cloned();
    attrs.raw = pattern == RAW;
    attrs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::parse_url;

    fn parse(url: &str) -> UrlAttrs {
        parse_url(url, true).unwrap().unwrap()
    }

    #[test]
    fn nested_groups() {
        let attrs = parse("https://gitlab.com/grp/sub-grp/proj");
        assert_eq!(attrs.provider, Provider::Gitlab);
        assert_eq!(attrs.id, "grp/sub-grp/proj");
        assert_eq!(attrs.commit, None);
    }

    #[test]
    fn views() {
        let tree = parse("https://gitlab.com/grp/proj/-/tree/abc123/docs");
        assert_eq!(tree.id, "grp/proj");
        assert_eq!(tree.commit.as_deref(), Some("abc123"));
        assert_eq!(tree.path.as_deref(), Some("docs"));

        let blob = parse("https://gitlab.com/grp/proj/-/blob/abc123/README");
        assert_eq!(blob.path.as_deref(), Some("README"));
        assert!(!blob.raw);

        let raw = parse("https://gitlab.com/grp/a/b/proj/-/raw/abc123/x/y.py");
        assert_eq!(raw.id, "grp/a/b/proj");
        assert_eq!(raw.path.as_deref(), Some("x/y.py"));
        assert!(raw.raw);
    }

    #[test]
    fn single_segment_is_not_a_project() {
        assert!(parse_url("https://gitlab.com/grp", false).unwrap().is_none());
    }
}
