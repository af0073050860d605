//! GitHub URL grammar
//!
//! ```text
//! github.com/<org>/<repo>[/tree/<commit>[/<path>]]
//! github.com/<org>/<repo>/blob/<commit>/<path>
//! raw.githubusercontent.com/<org>/<repo>/<commit>/<path>
//! ```

use crate::error::UrResult;
use crate::provider::pattern::{maybe, select, Captures, Grammar, UrlPattern, RAW};
use crate::provider::{Provider, UrlAttrs};
use std::sync::LazyLock;

const ORG: &str = r"(?P<org>[A-Za-z0-9_\-]+)";
const REPO: &str = r"(?P<repo>[A-Za-z0-9_\-\.]+)";
const COMMIT: &str = r"(?P<commit>[a-f0-9]+)";
const PATH: &str = r"(?P<path>[A-Za-z0-9_\-\./ ]+)";

static GRAMMAR: LazyLock<Grammar> = LazyLock::new(|| {
    Ok(vec![
        UrlPattern::new(
            "tree",
            format!(
                "^/{ORG}/{REPO}{}/?$",
                maybe(&format!("/tree/{COMMIT}{}", maybe(&format!("/{PATH}"))))
            ),
        )?,
        UrlPattern::new("blob", format!("^/{ORG}/{REPO}/blob/{COMMIT}/{PATH}$"))?,
        UrlPattern::new(RAW, format!("^/{ORG}/{REPO}/{COMMIT}/{PATH}$"))?,
    ])
});

pub fn patterns(raw: Option<bool>) -> UrResult<Vec<&'static UrlPattern>> {
    select(&GRAMMAR, raw)
}

pub(super) fn attrs(pattern: &str, caps: &Captures) -> UrlAttrs {
    let mut attrs = UrlAttrs::new(
        Provider::Github,
        format!("{}/{}", caps["org"], caps["repo"].trim_end_matches(".git")),
    );
    attrs.commit = caps.get("commit").cloned();
    attrs.path = caps.get("path").cloned();
    attrs.raw = pattern == RAW;
    attrs
}
