//! Helpers shared by unit tests: throwaway git repositories and in-memory
//! stand-ins for the network clients.

use crate::error::{UrError, UrResult};
use crate::git::{GitCli, GitClient};
use crate::http::{write_atomically, HttpClient};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args([
            "-c",
            "user.name=ur",
            "-c",
            "user.email=ur@example.com",
            "-c",
            "commit.gpgsign=false",
            "-c",
            "init.defaultBranch=main",
        ])
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {:?}: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).unwrap().trim().to_string()
}

/// Write `files` under `dir`
pub fn write_files(dir: &Path, files: &[(&str, &str)]) {
    for (name, body) in files {
        let path = dir.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }
}

/// Initialize a repository at `dir` holding `files`; returns the commit hash
pub fn init_repo(dir: &Path, files: &[(&str, &str)]) -> String {
    fs::create_dir_all(dir).unwrap();
    git(dir, &["init", "--quiet"]);
    commit_files(dir, files, "init")
}

/// Commit `files` on top of the repository at `dir`; returns the new hash
pub fn commit_files(dir: &Path, files: &[(&str, &str)], message: &str) -> String {
    write_files(dir, files);
    git(dir, &["add", "--all"]);
    git(dir, &["commit", "--quiet", "--allow-empty", "-m", message]);
    git(dir, &["rev-parse", "HEAD"])
}

/// [`GitClient`] that clones from local source repositories keyed by URL
#[derive(Default)]
pub struct FakeGit {
    sources: BTreeMap<String, PathBuf>,
    pub clones: AtomicUsize,
    pub pulls: AtomicUsize,
}

impl FakeGit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, url: &str, dir: &Path) -> Self {
        self.sources.insert(url.to_string(), dir.to_path_buf());
        self
    }

    pub fn clone_count(&self) -> usize {
        self.clones.load(Ordering::SeqCst)
    }

    pub fn pull_count(&self) -> usize {
        self.pulls.load(Ordering::SeqCst)
    }
}

impl GitClient for FakeGit {
    fn clone_repo(&self, url: &str, dest: &Path) -> UrResult<()> {
        self.clones.fetch_add(1, Ordering::SeqCst);
        let source = self.sources.get(url).ok_or_else(|| UrError::Git {
            command: "clone".into(),
            target: url.into(),
            stderr: "repository not found".into(),
        })?;
        GitCli::new().clone_repo(&source.to_string_lossy(), dest)
    }

    fn pull(&self, dir: &Path) -> UrResult<()> {
        self.pulls.fetch_add(1, Ordering::SeqCst);
        GitCli::new().pull(dir)
    }
}

/// [`HttpClient`] serving fixed bodies keyed by URL
#[derive(Default)]
pub struct FakeHttp {
    pages: Mutex<BTreeMap<String, Vec<u8>>>,
    pub downloads: AtomicUsize,
}

impl FakeHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.pages.lock().unwrap().insert(url.to_string(), body.into());
        self
    }

    pub fn download_count(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }
}

impl HttpClient for FakeHttp {
    fn download(&self, url: &str, dest: &Path) -> UrResult<()> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        let body = self
            .pages
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| UrError::Http {
                url: url.to_string(),
                reason: "404 Not Found".into(),
            })?;
        write_atomically(dest, |f| f.write_all(&body))
    }
}
