//! Identifier grammar accepted on the command line
//!
//! ```text
//! https://github.com/org/repo/blob/<sha>/path     any provider URL
//! gist:[<user>/]<id>[@<commit>][:<file>]
//! github:<org>/<repo>[@<commit>][:<path>]
//! gitlab:<group>/.../<project>[@<commit>][:<path>]
//! gists._<id>.<module>...                         dotted module paths
//! github.<org>.<repo>.<module>...
//! ./some/dir                                      anything else is local
//! ```

use crate::error::{UrError, UrResult};
use crate::provider::{from_attrs, parse_url, unmangle_segment, Commit, Provider, Repo, Target, UrlAttrs};
use crate::services::Services;
use crate::tree::ContentNode;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// A parsed, not yet resolved, identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identifier {
    /// Provider URL or prefixed id
    Remote(UrlAttrs),
    /// Dotted module path at a repository's head commit
    Module {
        provider: Provider,
        id: String,
        modules: Vec<String>,
    },
    Local(PathBuf),
}

/// What an identifier names
#[derive(Debug, Clone)]
pub enum Resolved {
    Remote(Target),
    Local(ContentNode),
}

impl Resolved {
    pub fn node(&self) -> ContentNode {
        match self {
            Self::Remote(target) => target.node(),
            Self::Local(node) => node.clone(),
        }
    }

    pub fn commit(&self) -> Option<&Arc<Commit>> {
        match self {
            Self::Remote(target) => Some(target.commit()),
            Self::Local(_) => None,
        }
    }
}

impl Identifier {
    pub fn parse(input: &str) -> UrResult<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(UrError::invalid_identifier(input, "empty identifier"));
        }

        if input.contains("://") {
            return parse_url(input, true)?
                .map(Self::Remote)
                .ok_or_else(|| UrError::invalid_identifier(input, "unrecognized URL"));
        }

        if let Some((prefix, rest)) = input.split_once(':') {
            if let Some(provider) = Provider::from_prefix(prefix) {
                return parse_prefixed(provider, rest, input).map(Self::Remote);
            }
        }

        if !Path::new(input).exists() {
            if let Some(module) = parse_dotted(input)? {
                return Ok(module);
            }
        }

        Ok(Self::Local(PathBuf::from(input)))
    }

    /// Clone, check out or stat whatever this names
    pub fn resolve(&self, services: &Arc<Services>, skip_cache: bool) -> UrResult<Resolved> {
        match self {
            Self::Remote(attrs) => from_attrs(services, attrs, skip_cache).map(Resolved::Remote),
            Self::Module {
                provider,
                id,
                modules,
            } => {
                let repo = Repo::open(services, *provider, id, skip_cache)?;
                let commit = repo.head_commit()?;
                if modules.is_empty() {
                    return Ok(Resolved::Remote(Target::Commit(commit)));
                }

                let root = commit.root();
                let node = root.find_module(modules.as_slice())?;
                let path = node
                    .url()
                    .strip_prefix(root.url())
                    .map(|p| p.trim_start_matches('/'))
                    .ok_or_else(|| UrError::Internal(format!("{} is not under {}", node, root)))?;
                debug!("{} resolved to {}", modules.join("."), path);
                Ok(Resolved::Remote(Target::File(commit.file(path)?)))
            }
            Self::Local(path) => {
                if !path.exists() {
                    return Err(UrError::PathNotFound(path.clone()));
                }
                Ok(Resolved::Local(ContentNode::path(path)))
            }
        }
    }
}

/// Parse and resolve `input` in one step
pub fn resolve(services: &Arc<Services>, input: &str, skip_cache: bool) -> UrResult<Resolved> {
    Identifier::parse(input)?.resolve(services, skip_cache)
}

fn is_name(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

fn is_hex(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f'))
}

fn parse_prefixed(provider: Provider, rest: &str, input: &str) -> UrResult<UrlAttrs> {
    let invalid = |reason: &str| UrError::invalid_identifier(input, reason);

    let (rest, path) = match rest.split_once(':') {
        Some((rest, path)) => (rest, Some(path.trim_matches('/'))),
        None => (rest, None),
    };
    let (name, commit) = match rest.split_once('@') {
        Some((name, commit)) => (name, Some(commit)),
        None => (rest, None),
    };
    if let Some(commit) = commit {
        if !is_hex(commit) {
            return Err(invalid("commit must be a hexadecimal hash"));
        }
    }

    let segments: Vec<&str> = name.split('/').collect();
    if !segments.iter().all(|s| is_name(s)) {
        return Err(invalid("malformed repository name"));
    }

    let mut attrs = match (provider, segments.as_slice()) {
        (Provider::Gist, [id]) => UrlAttrs::new(provider, *id),
        (Provider::Gist, [user, id]) => {
            let mut attrs = UrlAttrs::new(provider, *id);
            attrs.user = Some(user.to_string());
            attrs
        }
        (Provider::Gist, _) => return Err(invalid("expected gist:[<user>/]<id>")),
        (Provider::Github, [_, _]) => UrlAttrs::new(provider, name),
        (Provider::Github, _) => return Err(invalid("expected github:<org>/<repo>")),
        (Provider::Gitlab, [_, _, ..]) => UrlAttrs::new(provider, name),
        (Provider::Gitlab, _) => return Err(invalid("expected gitlab:<group>/<project>")),
    };
    if provider == Provider::Gist && !is_hex(&attrs.id) {
        return Err(invalid("gist ids are hexadecimal"));
    }

    attrs.commit = commit.map(str::to_string);
    attrs.path = path.filter(|p| !p.is_empty()).map(str::to_string);
    Ok(attrs)
}

/// `gists._<id>.<mod>...` or `github.<org>.<repo>.<mod>...`; `None` when
/// `input` does not start with a known package
fn parse_dotted(input: &str) -> UrResult<Option<Identifier>> {
    let segments: Vec<&str> = input.split('.').collect();
    let Some(provider) = Provider::from_package(segments[0]) else {
        return Ok(None);
    };
    if !segments
        .iter()
        .all(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'))
    {
        return Ok(None);
    }

    let (id, modules) = match (provider, &segments[1..]) {
        (Provider::Gist, [id, modules @ ..]) => {
            let id = unmangle_segment(id);
            if !is_hex(&id) {
                return Err(UrError::invalid_identifier(input, "gist ids are hexadecimal"));
            }
            (id, modules)
        }
        (Provider::Github, [org, repo, modules @ ..]) => (
            format!("{}/{}", unmangle_segment(org), unmangle_segment(repo)),
            modules,
        ),
        (Provider::Gitlab, _) => {
            return Err(UrError::invalid_identifier(
                input,
                "dotted GitLab paths are ambiguous; use gitlab:<group>/<project>",
            ))
        }
        _ => {
            return Err(UrError::invalid_identifier(
                input,
                format!("too few segments after '{}'", segments[0]),
            ))
        }
    };

    Ok(Some(Identifier::Module {
        provider,
        id,
        modules: modules.iter().map(|m| m.to_string()).collect(),
    }))
}
