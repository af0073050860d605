//! Exactly-one regex matching for URL grammars

use crate::error::{UrError, UrResult};
use regex::Regex;
use std::collections::BTreeMap;

/// Named capture groups of a successful match
pub type Captures = BTreeMap<String, String>;

/// A provider's patterns, compiled once into a `static LazyLock`
pub type Grammar = Result<Vec<UrlPattern>, regex::Error>;

/// Pattern name reserved for raw-content views
pub const RAW: &str = "raw";

/// A named, compiled URL-path shape
#[derive(Debug, Clone)]
pub struct UrlPattern {
    pub name: &'static str,
    regex: Regex,
}

impl UrlPattern {
    pub fn new(name: &'static str, source: impl AsRef<str>) -> Result<Self, regex::Error> {
        Ok(Self {
            name,
            regex: Regex::new(source.as_ref())?,
        })
    }

    pub fn source(&self) -> &str {
        self.regex.as_str()
    }

    pub fn is_raw(&self) -> bool {
        self.name == RAW
    }
}

/// Patterns of `grammar`, restricted to raw (`Some(true)`) or web
/// (`Some(false)`) views
pub fn select(grammar: &'static Grammar, raw: Option<bool>) -> UrResult<Vec<&'static UrlPattern>> {
    let patterns = grammar.as_ref().map_err(|e| UrError::Regex(e.clone()))?;
    Ok(patterns
        .iter()
        .filter(|p| raw.map_or(true, |raw| p.is_raw() == raw))
        .collect())
}

/// `(?:<re>)?`
pub fn maybe(re: &str) -> String {
    format!("(?:{})?", re)
}

/// Match `input` against every pattern; exactly one must match.
///
/// No match is an error when `throw` is set and `None` otherwise. Several
/// matches always fail, since that means the grammar itself is ambiguous.
pub fn match_one(
    patterns: &[&UrlPattern],
    input: &str,
    throw: bool,
) -> UrResult<Option<(&'static str, Captures)>> {
    let mut matched = Vec::new();
    for pattern in patterns {
        let regex = &pattern.regex;
        if let Some(caps) = regex.captures(input) {
            let groups: Captures = regex
                .capture_names()
                .flatten()
                .filter_map(|name| caps.name(name).map(|m| (name.to_string(), m.as_str().to_string())))
                .collect();
            matched.push((pattern.name, groups));
        }
    }

    match matched.len() {
        1 => Ok(matched.pop()),
        0 if throw => Err(UrError::NoMatch {
            input: input.to_string(),
            patterns: listing(patterns.iter().copied()),
        }),
        0 => Ok(None),
        count => {
            let names: Vec<&str> = matched.iter().map(|(name, _)| *name).collect();
            Err(UrError::AmbiguousMatch {
                input: input.to_string(),
                count,
                patterns: listing(patterns.iter().copied().filter(|p| names.contains(&p.name))),
            })
        }
    }
}

fn listing<'a>(patterns: impl Iterator<Item = &'a UrlPattern>) -> String {
    patterns
        .map(|p| format!("{}: {}", p.name, p.source()))
        .collect::<Vec<_>>()
        .join("\n\t")
}
