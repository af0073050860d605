//! Gist URL grammar and page scraping
//!
//! ```text
//! gist.github.com/[<user>/]<id>[/<commit>][#<fragment>]
//! gist.githubusercontent.com/<user>/<id>/raw[/<commit>][/<file>]
//! ```
//!
//! Commits in gist URLs are full 40-digit hashes and gist ids never are,
//! which keeps `<user>/<id>` apart from `<id>/<commit>`.

use crate::cache::Entity;
use crate::error::{UrError, UrResult};
use crate::provider::pattern::{match_one, maybe, select, Captures, Grammar, UrlPattern, RAW};
use crate::provider::repo::{Commit, Repo};
use crate::provider::{Provider, Target, UrlAttrs};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};
use tracing::{debug, warn};

const USER: &str = r"(?P<user>[A-Za-z0-9_\-]+)";
const ID: &str = r"(?P<id>[a-f0-9]{1,39}|[a-f0-9]{41,})";
const COMMIT: &str = r"(?P<commit>[a-f0-9]{40})";
const FILE: &str = r"(?P<file>[A-Za-z0-9_\-\.]+)";

static GRAMMAR: LazyLock<Grammar> = LazyLock::new(|| {
    Ok(vec![
        UrlPattern::new(
            "www",
            format!("^{}/{ID}{}$", maybe(&format!("/{USER}")), maybe(&format!("/{COMMIT}"))),
        )?,
        UrlPattern::new(
            RAW,
            format!(
                "^/{USER}/{ID}/raw{}{}$",
                maybe(&format!("/{COMMIT}")),
                maybe(&format!("/{FILE}"))
            ),
        )?,
    ])
});

static AUTHOR: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| {
    Regex::new(r#"(?s)class="[^"]*\bauthor\b[^"]*"[^>]*>\s*<a\b[^>]*>\s*([^<\s][^<]*?)\s*</a>"#)
});

static LINKS: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| {
    Regex::new(r##"href="(?:#(?P<fragment>file-[A-Za-z0-9_\-]+)|(?P<raw>/[^"#?]+/raw/[^"#?]+))""##)
});

pub fn patterns(raw: Option<bool>) -> UrResult<Vec<&'static UrlPattern>> {
    select(&GRAMMAR, raw)
}

fn compiled(regex: &'static Result<Regex, regex::Error>) -> UrResult<&'static Regex> {
    regex.as_ref().map_err(|e| UrError::Regex(e.clone()))
}

pub(super) fn attrs(pattern: &str, caps: &Captures) -> UrlAttrs {
    let mut attrs = UrlAttrs::new(Provider::Gist, caps["id"].as_str());
    attrs.user = caps.get("user").cloned();
    attrs.commit = caps.get("commit").cloned();
    attrs.path = caps.get("file").cloned();
    attrs.raw = pattern == RAW;
    attrs
}

/// Raw-content URL of `file` at `sha`
pub fn raw_url(user: &str, id: &str, sha: &str, file: &str) -> String {
    format!("https://gist.githubusercontent.com/{user}/{id}/raw/{sha}/{file}")
}

/// Web URL of `file` at `sha`, via its page anchor
pub fn file_url(user: &str, id: &str, sha: &str, fragment: &str) -> String {
    format!("https://gist.github.com/{user}/{id}/{sha}#{fragment}")
}

/// Resolve gist attributes.
///
/// A user in the URL must own the gist. A fragment selects a file via the
/// commit page's anchors; a raw URL without a file is only accepted for
/// single-file gists.
pub(super) fn from_attrs(repo: Arc<Repo>, attrs: &UrlAttrs) -> UrResult<Target> {
    if let Some(user) = &attrs.user {
        let owner = repo.get(&Repo::USER)?;
        if !owner.eq_ignore_ascii_case(user) {
            return Err(UrError::UserMismatch {
                id: attrs.id.clone(),
                expected: user.clone(),
                actual: owner,
            });
        }
    }

    let commit = match &attrs.commit {
        Some(sha) => repo.commit(sha)?,
        None => repo.head_commit()?,
    };

    if let Some(file) = &attrs.path {
        return Ok(Target::File(commit.file(file)?));
    }
    if let Some(fragment) = &attrs.fragment {
        let fragments = commit.get(&Commit::FRAGMENTS)?;
        let name = fragments
            .get(fragment)
            .ok_or_else(|| UrError::not_found(format!("#{}", fragment), commit.www_url()))?;
        return Ok(Target::File(commit.file(name)?));
    }
    if attrs.raw {
        let files = commit.file_names()?;
        return match files.as_slice() {
            [only] => Ok(Target::File(commit.file(only)?)),
            _ => Err(UrError::invalid_identifier(
                repo.www_url(),
                format!(
                    "a raw URL without a file needs a single-file gist; found {} ({})",
                    files.len(),
                    files.join(", ")
                ),
            )),
        };
    }
    Ok(Target::Commit(commit))
}

/// Owner login from a gist page
pub fn scrape_user(html: &str, url: &str) -> UrResult<String> {
    compiled(&AUTHOR)?
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| UrError::PageFormat {
            url: url.to_string(),
            reason: "no author link".to_string(),
        })
}

/// Per-file anchors (`file-foo-py`) to file names, from a gist commit page.
///
/// Each file block holds its header anchor followed by a "Raw" link whose
/// URL names the file; the two are paired in document order.
pub fn scrape_fragments(html: &str, url: &str) -> UrResult<BTreeMap<String, String>> {
    let links = compiled(&LINKS)?;
    let raw_patterns = patterns(Some(true))?;

    let mut fragments = BTreeMap::new();
    let mut pending: Option<String> = None;
    for caps in links.captures_iter(html) {
        if let Some(fragment) = caps.name("fragment") {
            pending = Some(fragment.as_str().to_string());
            continue;
        }
        let Some(raw) = caps.name("raw") else {
            continue;
        };
        let Some(fragment) = pending.take() else {
            debug!("Raw link {} has no preceding file anchor", raw.as_str());
            continue;
        };
        match match_one(&raw_patterns, raw.as_str(), false) {
            Ok(Some((_, caps))) if caps.contains_key("file") => {
                fragments.insert(fragment, caps["file"].clone());
            }
            _ => warn!("Unrecognized raw file URL {} on {}", raw.as_str(), url),
        }
    }

    if fragments.is_empty() {
        return Err(UrError::PageFormat {
            url: url.to_string(),
            reason: "no file anchors with raw links".to_string(),
        });
    }
    Ok(fragments)
}
