//! HTTP downloads for pages and raw content

use crate::error::{UrError, UrResult};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Fetch a URL into a file
pub trait HttpClient: Send + Sync {
    /// Download `url` to `dest`.
    ///
    /// The body lands in `<dest>.part` and is renamed into place once
    /// complete, so `dest` either does not exist or holds a full response.
    fn download(&self, url: &str, dest: &Path) -> UrResult<()>;
}

/// [`HttpClient`] backed by a blocking `ureq` agent
pub struct UreqClient {
    agent: ureq::Agent,
    tokens: Vec<(String, String)>,
}

impl UreqClient {
    pub fn new() -> Self {
        Self::with_tokens(Vec::new())
    }

    /// Send a bearer `Authorization` header to URLs under each prefix
    pub fn with_tokens(tokens: Vec<(String, String)>) -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
            tokens,
        }
    }

    fn token_for(&self, url: &str) -> Option<&str> {
        self.tokens
            .iter()
            .find(|(prefix, _)| url.starts_with(prefix.as_str()))
            .map(|(_, token)| token.as_str())
    }
}

impl Default for UreqClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for UreqClient {
    fn download(&self, url: &str, dest: &Path) -> UrResult<()> {
        info!("Fetching {} to {}", url, dest.display());

        let mut request = self.agent.get(url);
        if let Some(token) = self.token_for(url) {
            request = request.header("Authorization", format!("Bearer {}", token));
        }
        let mut response = request.call().map_err(|e| UrError::Http {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        debug!("{} -> {}", url, response.status());

        let mut body = response.body_mut().as_reader();
        write_atomically(dest, |file| io::copy(&mut body, file).map(|_| ()))
            .map_err(|e| match e {
                UrError::Io { source, .. } => UrError::Http {
                    url: url.to_string(),
                    reason: source.to_string(),
                },
                other => other,
            })
    }
}

/// Path of the in-progress download for `dest`
pub fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}

/// Write via `fill` into `<dest>.part`, then rename onto `dest`.
///
/// A failed `fill` removes the partial file.
pub fn write_atomically<F>(dest: &Path, fill: F) -> UrResult<()>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let part = part_path(dest);
    let mut file = File::create(&part)
        .map_err(|e| UrError::io(format!("creating {}", part.display()), e))?;

    if let Err(e) = fill(&mut file).and_then(|_| file.sync_all()) {
        drop(file);
        let _ = fs::remove_file(&part);
        return Err(UrError::io(format!("writing {}", part.display()), e));
    }
    drop(file);

    fs::rename(&part, dest)
        .map_err(|e| UrError::io(format!("moving {} into place", dest.display()), e))
}
