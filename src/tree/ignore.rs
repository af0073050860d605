//! `.urignore` files and recursive listing
//!
//! Each non-comment line is a shell-style pattern matched against node URLs
//! as `*/<pattern>`; a leading `!` re-includes. The last matching rule wins.

use crate::error::UrResult;
use crate::tree::ContentNode;
use regex::Regex;
use tracing::debug;

/// File name consulted in each directory during a walk
pub const IGNORE_FILE: &str = ".urignore";

#[derive(Debug, Clone)]
struct Rule {
    pattern: String,
    regex: Regex,
    include: bool,
}

/// Parsed ignore rules
#[derive(Debug, Clone, Default)]
pub struct UrIgnore {
    rules: Vec<Rule>,
}

impl UrIgnore {
    /// Parse rule lines; blank lines and `#` comments are skipped
    pub fn parse<S: AsRef<str>>(lines: &[S]) -> UrResult<Self> {
        let mut rules = Vec::new();
        for line in lines.iter().map(AsRef::as_ref) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (pattern, include) = match line.strip_prefix('!') {
                Some(rest) => (rest, true),
                None => (line, false),
            };
            rules.push(Rule {
                pattern: pattern.to_string(),
                regex: Regex::new(&fnmatch_regex(&format!("*/{}", pattern)))?,
                include,
            });
        }
        Ok(Self { rules })
    }

    /// Rules from an ignore file node
    pub fn from_node(node: &ContentNode) -> UrResult<Self> {
        Self::parse(&node.read_lines(true)?)
    }

    /// Append `other`'s rules after this one's, so they take precedence
    pub fn extend(&mut self, other: &UrIgnore) {
        self.rules.extend(other.rules.iter().cloned());
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether a node at `url` stays visible
    pub fn check(&self, url: &str) -> bool {
        let mut include = true;
        for rule in &self.rules {
            if rule.regex.is_match(url) {
                debug!("urignore: {} matches {}", url, rule.pattern);
                include = rule.include;
            }
        }
        include
    }
}

/// Translate a shell pattern (`*`, `?`, `[...]`, `[!...]`) into an anchored
/// regex; `*` also matches `/`.
///
/// Brackets follow `fnmatch`: only `!` negates, `^` is literal, `]` right
/// after the opening bracket is a member, an unclosed `[` is literal and
/// reversed ranges match nothing. The output always compiles.
pub fn fnmatch_regex(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::from("(?s)^");
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '[' => {
                let mut j = i + 1;
                if j < chars.len() && chars[j] == '!' {
                    j += 1;
                }
                if j < chars.len() && chars[j] == ']' {
                    j += 1;
                }
                while j < chars.len() && chars[j] != ']' {
                    j += 1;
                }
                if j >= chars.len() {
                    out.push_str("\\[");
                } else {
                    out.push_str(&bracket_class(&chars[i + 1..j]));
                    i = j;
                }
            }
            c => out.push_str(&regex::escape(&c.to_string())),
        }
        i += 1;
    }
    out.push('$');
    out
}

/// Regex class for the members between `[` and `]`
fn bracket_class(body: &[char]) -> String {
    let (negate, body) = match body.split_first() {
        Some(('!', rest)) => (true, rest),
        _ => (false, body),
    };

    let mut members = String::new();
    let mut k = 0;
    while k < body.len() {
        if k + 2 < body.len() && body[k + 1] == '-' {
            let (lo, hi) = (body[k], body[k + 2]);
            if lo <= hi {
                push_class_char(&mut members, lo);
                members.push('-');
                push_class_char(&mut members, hi);
            }
            k += 3;
        } else {
            push_class_char(&mut members, body[k]);
            k += 1;
        }
    }

    match (negate, members.is_empty()) {
        (true, true) => ".".to_string(),
        (false, true) => "[^\\x00-\\x{10FFFF}]".to_string(),
        (true, false) => format!("[^{}]", members),
        (false, false) => format!("[{}]", members),
    }
}

fn push_class_char(out: &mut String, c: char) {
    if matches!(c, '\\' | '[' | ']' | '^' | '-' | '&' | '~') {
        out.push('\\');
    }
    out.push(c);
}

/// Every node below `root` in depth-first, name order.
///
/// Unless `all` is set, `.git` directories are skipped and each directory's
/// `.urignore` hides matching descendants (rules from deeper files win).
pub fn walk(root: &ContentNode, all: bool) -> UrResult<Vec<ContentNode>> {
    let mut out = Vec::new();
    walk_into(root, all, &UrIgnore::default(), &mut out)?;
    Ok(out)
}

fn walk_into(
    dir: &ContentNode,
    all: bool,
    inherited: &UrIgnore,
    out: &mut Vec<ContentNode>,
) -> UrResult<()> {
    let children = dir.children()?;

    let mut ignore = inherited.clone();
    if !all {
        if let Some(file) = children.get(IGNORE_FILE).filter(|n| n.is_file()) {
            ignore.extend(&UrIgnore::from_node(file)?);
        }
    }

    for (name, child) in children {
        if !all && (name == ".git" || !ignore.check(child.url())) {
            continue;
        }
        let is_dir = child.is_dir();
        out.push(child.clone());
        if is_dir {
            walk_into(&child, all, &ignore, out)?;
        }
    }
    Ok(())
}
