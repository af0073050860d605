//! ur - universal references to files in code-hosting repositories
//!
//! Gists, GitHub and GitLab repositories are cloned on demand into a
//! content-addressed cache; identifiers (URLs, `github:org/repo` ids,
//! dotted module paths) resolve to a uniform [`tree::ContentNode`] whose
//! files can be listed and read.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod http;
pub mod identifier;
pub mod provider;
pub mod remote;
pub mod services;
pub mod tree;
pub mod ui;

#[cfg(test)]
mod test_support;

pub use error::{UrError, UrResult};
