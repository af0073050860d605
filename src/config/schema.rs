//! Configuration schema for ur
//!
//! Configuration is stored at `~/.config/ur/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Cache settings
    pub cache: CacheConfig,

    /// Hosting-provider tokens
    pub auth: AuthConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,

    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            log_format: "text".to_string(),
        }
    }
}

/// Cache configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache root; `.objs` in the current directory when unset
    pub root: Option<PathBuf>,

    /// Recompute every field and refresh every download
    pub skip: bool,
}

/// Tokens forwarded to hosting providers. Never written to the cache.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Token for github.com, gists and raw.githubusercontent.com
    pub github_token: Option<String>,

    /// Token for gitlab.com
    pub gitlab_token: Option<String>,
}

const GITHUB_PREFIXES: &[&str] = &[
    "https://github.com/",
    "https://gist.github.com/",
    "https://raw.githubusercontent.com/",
    "https://gist.githubusercontent.com/",
];

const GITLAB_PREFIXES: &[&str] = &["https://gitlab.com/"];

impl AuthConfig {
    /// `(url prefix, token)` pairs for every configured token
    pub fn url_tokens(&self) -> Vec<(String, String)> {
        let mut tokens = Vec::new();
        for (token, prefixes) in [
            (&self.github_token, GITHUB_PREFIXES),
            (&self.gitlab_token, GITLAB_PREFIXES),
        ] {
            if let Some(token) = token.as_deref().filter(|t| !t.is_empty()) {
                tokens.extend(
                    prefixes
                        .iter()
                        .map(|prefix| (prefix.to_string(), token.to_string())),
                );
            }
        }
        tokens
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |t: &Option<String>| t.as_ref().map(|_| "***");
        f.debug_struct("AuthConfig")
            .field("github_token", &mask(&self.github_token))
            .field("gitlab_token", &mask(&self.gitlab_token))
            .finish()
    }
}
