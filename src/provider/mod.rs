//! Hosting-provider identity resolution
//!
//! Each provider (gists, GitHub, GitLab) contributes a URL grammar. A URL
//! parses to [`UrlAttrs`]; [`from_attrs`] turns those into a [`Target`],
//! cloning the repository as needed.

pub mod gist;
pub mod github;
pub mod gitlab;
pub mod pattern;
pub mod repo;

pub use pattern::{match_one, Captures, UrlPattern};
pub use repo::{Commit, File, Repo};

use crate::error::{UrError, UrResult};
use crate::services::Services;
use crate::tree::ContentNode;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A code-hosting service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    Gist,
    Github,
    Gitlab,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::Gist, Provider::Github, Provider::Gitlab];

    /// Cache type name of this provider's repositories
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Gist => "Gist",
            Self::Github => "Github",
            Self::Gitlab => "Gitlab",
        }
    }

    /// Identifier prefix (`gist:`), also the first segment of commit keys
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Gist => "gist",
            Self::Github => "github",
            Self::Gitlab => "gitlab",
        }
    }

    /// Top-level package names accepted in dotted module paths
    pub fn packages(self) -> &'static [&'static str] {
        match self {
            Self::Gist => &["gists", "gist"],
            Self::Github => &["github", "gh"],
            Self::Gitlab => &["gitlab", "gl"],
        }
    }

    pub fn from_prefix(prefix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.prefix() == prefix)
    }

    pub fn from_package(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.packages().contains(&name))
    }

    /// Provider serving `domain`, and whether the domain only serves raw
    /// content (`Some(true)`), only web pages (`Some(false)`) or both
    pub fn from_domain(domain: &str) -> Option<(Self, Option<bool>)> {
        match domain {
            "gist.github.com" => Some((Self::Gist, Some(false))),
            "gist.githubusercontent.com" => Some((Self::Gist, Some(true))),
            "github.com" => Some((Self::Github, Some(false))),
            "raw.githubusercontent.com" => Some((Self::Github, Some(true))),
            "gitlab.com" => Some((Self::Gitlab, None)),
            _ => None,
        }
    }

    /// URL-path shapes; `raw` restricts to raw (`Some(true)`) or web
    /// (`Some(false)`) views
    pub fn patterns(self, raw: Option<bool>) -> UrResult<Vec<&'static UrlPattern>> {
        match self {
            Self::Gist => gist::patterns(raw),
            Self::Github => github::patterns(raw),
            Self::Gitlab => gitlab::patterns(raw),
        }
    }

    /// Parse a full URL on one of this provider's domains
    pub fn parse_url(self, url: &str, throw: bool) -> UrResult<Option<UrlAttrs>> {
        let Some((parts, provider, raw)) = split_provider_url(url, throw)? else {
            return Ok(None);
        };
        if provider != self {
            return reject(
                throw,
                UrError::UrlDomain {
                    provider: self.type_name().to_string(),
                    domain: parts.host.to_string(),
                    url: url.to_string(),
                },
            );
        }
        self.parse_path(parts.path, raw, parts.fragment, throw)
    }

    /// Parse the path of a URL known to belong to this provider
    pub fn parse_path(
        self,
        path: &str,
        raw: Option<bool>,
        fragment: Option<&str>,
        throw: bool,
    ) -> UrResult<Option<UrlAttrs>> {
        let Some((name, caps)) = match_one(&self.patterns(raw)?, path, throw)? else {
            return Ok(None);
        };
        debug!("{} matched {} pattern {}", path, self.type_name(), name);

        let mut attrs = match self {
            Self::Gist => gist::attrs(name, &caps),
            Self::Github => github::attrs(name, &caps),
            Self::Gitlab => gitlab::attrs(name, &caps),
        };
        if let Some(fragment) = fragment.filter(|f| !f.is_empty()) {
            attrs.fragment = Some(fragment.to_string());
        }
        Ok(Some(attrs))
    }

    /// Clone URL
    pub fn git_url(self, id: &str) -> String {
        format!("{}.git", self.www_url(id))
    }

    pub fn www_url(self, id: &str) -> String {
        match self {
            Self::Gist => format!("https://gist.github.com/{}", id),
            Self::Github => format!("https://github.com/{}", id),
            Self::Gitlab => format!("https://gitlab.com/{}", id),
        }
    }

    /// Web view of the tree at `sha`
    pub fn commit_url(self, id: &str, sha: &str) -> String {
        match self {
            Self::Gist => format!("{}/{}", self.www_url(id), sha),
            Self::Github => format!("{}/tree/{}", self.www_url(id), sha),
            Self::Gitlab => format!("{}/-/tree/{}", self.www_url(id), sha),
        }
    }

    /// Python-importable module name for repository `id`
    pub fn module_name(self, id: &str) -> String {
        let mut name = self.packages()[0].to_string();
        for segment in id.split('/') {
            name.push('.');
            name.push_str(&module_segment(segment));
        }
        name
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Everything a URL or identifier says about its target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlAttrs {
    pub provider: Provider,
    /// Gist id, `org/repo` or `group/.../project`
    pub id: String,
    /// Gist owner named in the URL
    pub user: Option<String>,
    pub commit: Option<String>,
    /// File or directory relative to the repository root
    pub path: Option<String>,
    /// Gist per-file anchor
    pub fragment: Option<String>,
    /// Came from a raw-content URL
    pub raw: bool,
}

impl UrlAttrs {
    pub fn new(provider: Provider, id: impl Into<String>) -> Self {
        Self {
            provider,
            id: id.into(),
            user: None,
            commit: None,
            path: None,
            fragment: None,
            raw: false,
        }
    }
}

/// What an identifier resolves to inside a repository
#[derive(Debug, Clone)]
pub enum Target {
    /// A whole commit tree
    Commit(Arc<Commit>),
    /// A file or directory at a commit
    File(File),
}

impl Target {
    pub fn commit(&self) -> &Arc<Commit> {
        match self {
            Self::Commit(commit) => commit,
            Self::File(file) => file.commit(),
        }
    }

    pub fn node(&self) -> ContentNode {
        match self {
            Self::Commit(commit) => commit.root(),
            Self::File(file) => file.node().clone(),
        }
    }
}

/// Resolve parsed attributes, cloning the repository if needed
pub fn from_attrs(services: &Arc<Services>, attrs: &UrlAttrs, skip_cache: bool) -> UrResult<Target> {
    let repo = Repo::open(services, attrs.provider, &attrs.id, skip_cache)?;
    if attrs.provider == Provider::Gist {
        return gist::from_attrs(repo, attrs);
    }

    let commit = match &attrs.commit {
        Some(sha) => repo.commit(sha)?,
        None => repo.head_commit()?,
    };
    match attrs.path.as_deref().map(|p| p.trim_matches('/')) {
        Some(path) if !path.is_empty() => Ok(Target::File(commit.file(path)?)),
        _ => Ok(Target::Commit(commit)),
    }
}

/// Parse a URL on any known provider domain
pub fn parse_url(url: &str, throw: bool) -> UrResult<Option<UrlAttrs>> {
    let Some((parts, provider, raw)) = split_provider_url(url, throw)? else {
        return Ok(None);
    };
    provider.parse_path(parts.path, raw, parts.fragment, throw)
}

/// Pieces of a URL this crate cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UrlParts<'a> {
    pub scheme: &'a str,
    pub host: &'a str,
    /// Starts with `/` unless empty; query string removed
    pub path: &'a str,
    pub fragment: Option<&'a str>,
}

/// Split `url` without validating it; `None` if it has no `scheme://`
pub fn split_url(url: &str) -> Option<UrlParts<'_>> {
    let (scheme, rest) = url.split_once("://")?;
    let (rest, fragment) = match rest.split_once('#') {
        Some((rest, fragment)) => (rest, Some(fragment)),
        None => (rest, None),
    };
    let rest = rest.split_once('?').map_or(rest, |(rest, _)| rest);
    let (host, path) = match rest.find('/') {
        Some(i) => rest.split_at(i),
        None => (rest, ""),
    };
    Some(UrlParts {
        scheme,
        host,
        path,
        fragment,
    })
}

fn reject<T>(throw: bool, err: UrError) -> UrResult<Option<T>> {
    if throw {
        Err(err)
    } else {
        Ok(None)
    }
}

fn split_provider_url(
    url: &str,
    throw: bool,
) -> UrResult<Option<(UrlParts<'_>, Provider, Option<bool>)>> {
    let parts = split_url(url).unwrap_or(UrlParts {
        scheme: "",
        host: "",
        path: url,
        fragment: None,
    });
    if parts.scheme != "https" {
        return reject(
            throw,
            UrError::UrlScheme {
                scheme: parts.scheme.to_string(),
                url: url.to_string(),
            },
        );
    }
    match Provider::from_domain(parts.host) {
        Some((provider, raw)) => Ok(Some((parts, provider, raw))),
        None => reject(
            throw,
            UrError::UrlDomain {
                provider: "hosting".to_string(),
                domain: parts.host.to_string(),
                url: url.to_string(),
            },
        ),
    }
}

/// Make one path segment importable: `-` and `.` become `_`, and a leading
/// digit gets a `_` prefix
pub fn module_segment(segment: &str) -> String {
    let name = segment.replace(['-', '.'], "_");
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{}", name)
    } else {
        name
    }
}

/// Inverse of [`module_segment`] for dotted identifiers: drop one leading
/// `_` and read remaining `_` as `-`
pub fn unmangle_segment(segment: &str) -> String {
    segment
        .strip_prefix('_')
        .unwrap_or(segment)
        .replace('_', "-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_url_parts() {
        let parts = split_url("https://gist.github.com/abc/123?x=1#file-a-py").unwrap();
        assert_eq!(parts.scheme, "https");
        assert_eq!(parts.host, "gist.github.com");
        assert_eq!(parts.path, "/abc/123");
        assert_eq!(parts.fragment, Some("file-a-py"));

        assert_eq!(split_url("https://github.com").unwrap().path, "");
        assert!(split_url("github.com/a/b").is_none());
    }

    #[test]
    fn scheme_and_domain_follow_throw() {
        assert!(matches!(
            parse_url("http://github.com/a/b", true),
            Err(UrError::UrlScheme { .. })
        ));
        assert!(parse_url("http://github.com/a/b", false).unwrap().is_none());
        assert!(matches!(
            parse_url("https://bitbucket.org/a/b", true),
            Err(UrError::UrlDomain { .. })
        ));
        assert!(parse_url("https://bitbucket.org/a/b", false).unwrap().is_none());
        assert!(matches!(
            Provider::Gitlab.parse_url("https://github.com/a/b", true),
            Err(UrError::UrlDomain { .. })
        ));
    }

    #[test]
    fn unmatched_path_follows_throw() {
        assert!(matches!(
            parse_url("https://github.com/only-org", true),
            Err(UrError::NoMatch { .. })
        ));
        assert!(parse_url("https://github.com/only-org", false).unwrap().is_none());
    }

    #[test]
    fn no_url_matches_two_patterns() {
        let urls = [
            "https://gist.github.com/ryan-williams/0a1b2c",
            "https://gist.github.com/0a1b2c/0123456789abcdef0123456789abcdef01234567",
            "https://gist.githubusercontent.com/u/0a1b2c/raw/0123456789abcdef0123456789abcdef01234567/a.py",
            "https://github.com/org/repo",
            "https://github.com/org/repo/tree/abc123/src/lib",
            "https://github.com/org/repo/blob/abc123/README",
            "https://raw.githubusercontent.com/org/repo/abc123/README",
            "https://gitlab.com/group/sub/project/-/tree/abc123/README",
            "https://gitlab.com/group/sub/project/-/blob/abc123/README",
            "https://gitlab.com/group/sub/project/-/raw/abc123/README",
        ];
        for url in urls {
            assert!(parse_url(url, true).unwrap().is_some(), "{url}");
        }
    }

    #[test]
    fn module_names() {
        assert_eq!(Provider::Gist.module_name("0a1b"), "gists._0a1b");
        assert_eq!(
            Provider::Github.module_name("runsascoded/ur-test"),
            "github.runsascoded.ur_test"
        );
        assert_eq!(
            Provider::Gitlab.module_name("grp/3d/proj.js"),
            "gitlab.grp._3d.proj_js"
        );
        assert_eq!(unmangle_segment("_0a1b"), "0a1b");
        assert_eq!(unmangle_segment("ur_test"), "ur-test");
    }

    #[test]
    fn urls() {
        assert_eq!(Provider::Github.git_url("a/b"), "https://github.com/a/b.git");
        assert_eq!(
            Provider::Gitlab.commit_url("g/p", "abc"),
            "https://gitlab.com/g/p/-/tree/abc"
        );
        assert_eq!(
            Provider::Gist.commit_url("0a1b", "abc"),
            "https://gist.github.com/0a1b/abc"
        );
    }

    #[test]
    fn lookups() {
        assert_eq!(Provider::from_prefix("gitlab"), Some(Provider::Gitlab));
        assert_eq!(Provider::from_package("gh"), Some(Provider::Github));
        assert_eq!(Provider::from_package("gists"), Some(Provider::Gist));
        assert_eq!(Provider::from_package("numpy"), None);
    }
}
