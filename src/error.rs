//! Error types for ur
//!
//! All modules use `UrResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for ur operations
pub type UrResult<T> = Result<T, UrError>;

/// Coarse classification of an error, used by callers that only care about
/// the family of failure (and by the CLI to pick an exit message).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Parse,
    NotFound,
    Fetch,
    Precondition,
    Decode,
    Io,
    Config,
    Internal,
}

/// All errors that can occur in ur
#[derive(Error, Debug)]
pub enum UrError {
    // Parse errors
    #[error("No pattern matched {input}:\n\t{patterns}")]
    NoMatch { input: String, patterns: String },

    #[error("Ambiguous parse of {input}; {count} patterns matched:\n\t{patterns}")]
    AmbiguousMatch {
        input: String,
        count: usize,
        patterns: String,
    },

    #[error("Invalid URL scheme '{scheme}' in {url}")]
    UrlScheme { scheme: String, url: String },

    #[error("Unrecognized {provider} URL domain '{domain}' ({url})")]
    UrlDomain {
        provider: String,
        domain: String,
        url: String,
    },

    #[error("Invalid identifier '{input}': {reason}")]
    InvalidIdentifier { input: String, reason: String },

    #[error("Invalid cache key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("Gist {id} belongs to {actual}, not {expected}")]
    UserMismatch {
        id: String,
        expected: String,
        actual: String,
    },

    // Not-found errors
    #[error("{name} not found in {within}")]
    NotFound { name: String, within: String },

    #[error("Commit {commit} not found in {repo}")]
    CommitNotFound { commit: String, repo: String },

    #[error("Path does not exist: {0}")]
    PathNotFound(PathBuf),

    // Fetch errors
    #[error("git {command} failed ({target}): {stderr}")]
    Git {
        command: String,
        target: String,
        stderr: String,
    },

    #[error("HTTP fetch of {url} failed: {reason}")]
    Http { url: String, reason: String },

    // Traversal misuse
    #[error("Cannot read {0}: it is a directory")]
    ReadDirectory(String),

    #[error("Cannot list children of {0}: it is not a directory")]
    ChildrenOfFile(String),

    // Decode errors
    #[error("Failed to decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("Unexpected page format at {url}: {reason}")]
    PageFormat { url: String, reason: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Invalid pattern: {0}")]
    Regex(#[from] regex::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl UrError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a not-found error
    pub fn not_found(name: impl Into<String>, within: impl Into<String>) -> Self {
        Self::NotFound {
            name: name.into(),
            within: within.into(),
        }
    }

    /// Create an invalid identifier error
    pub fn invalid_identifier(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Which family of failure this is
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoMatch { .. }
            | Self::AmbiguousMatch { .. }
            | Self::UrlScheme { .. }
            | Self::UrlDomain { .. }
            | Self::InvalidIdentifier { .. }
            | Self::InvalidKey { .. }
            | Self::UserMismatch { .. } => ErrorKind::Parse,
            Self::NotFound { .. } | Self::CommitNotFound { .. } | Self::PathNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::Git { .. } | Self::Http { .. } | Self::CommandFailed { .. } => ErrorKind::Fetch,
            Self::ReadDirectory(_) | Self::ChildrenOfFile(_) => ErrorKind::Precondition,
            Self::Decode { .. } | Self::PageFormat { .. } | Self::Json(_) => ErrorKind::Decode,
            Self::Io { .. } => ErrorKind::Io,
            Self::ConfigInvalid { .. }
            | Self::ConfigDirCreate { .. }
            | Self::TomlParse(_)
            | Self::TomlSerialize(_) => ErrorKind::Config,
            Self::Regex(_) | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::CommandFailed { .. } => Some("Is git installed and on PATH?"),
            Self::AmbiguousMatch { .. } => {
                Some("This is a bug in the URL grammar; please report the URL")
            }
            Self::Decode { .. } => {
                Some("The cache file may be truncated; delete it or pass --skip-cache")
            }
            Self::Http { .. } | Self::Git { .. } => {
                Some("Private repositories need a token in the [auth] config section")
            }
            _ => None,
        }
    }
}
