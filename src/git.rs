//! Git access via the `git` executable
//!
//! Network operations (`clone`, `pull`) sit behind the [`GitClient`] trait
//! so callers can substitute them; reading objects out of an existing clone
//! is done through [`GitRepo`].

use crate::error::{UrError, UrResult};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info};

/// Network half of git: create or refresh a local clone
pub trait GitClient: Send + Sync {
    /// Clone `url` into `dest`, which must not exist yet
    fn clone_repo(&self, url: &str, dest: &Path) -> UrResult<()>;

    /// Fast-forward the clone at `dir` from its origin
    fn pull(&self, dir: &Path) -> UrResult<()>;
}

/// [`GitClient`] backed by the `git` binary
#[derive(Debug, Clone, Default)]
pub struct GitCli {
    tokens: Vec<(String, String)>,
}

impl GitCli {
    pub fn new() -> Self {
        Self::default()
    }

    /// Send a bearer token to every URL starting with the paired prefix
    pub fn with_tokens(tokens: Vec<(String, String)>) -> Self {
        Self { tokens }
    }

    /// `-c http.<prefix>.extraHeader=...` per token; git scopes each header
    /// to URLs under its prefix
    fn auth_args(&self) -> Vec<String> {
        self.tokens
            .iter()
            .flat_map(|(prefix, token)| {
                [
                    "-c".to_string(),
                    format!("http.{}.extraHeader=Authorization: Bearer {}", prefix, token),
                ]
            })
            .collect()
    }
}

impl GitClient for GitCli {
    fn clone_repo(&self, url: &str, dest: &Path) -> UrResult<()> {
        info!("Cloning {} into {}", url, dest.display());
        let mut args = self.auth_args();
        args.extend([
            "clone".to_string(),
            "--quiet".to_string(),
            url.to_string(),
            dest.to_string_lossy().into_owned(),
        ]);
        run_git(None, &args, url).map(|_| ())
    }

    fn pull(&self, dir: &Path) -> UrResult<()> {
        info!("{} exists; pulling", dir.display());
        let mut args = self.auth_args();
        args.extend(["pull".to_string(), "--quiet".to_string(), "--ff-only".to_string()]);
        run_git(Some(dir), &args, &dir.display().to_string()).map(|_| ())
    }
}

/// Run git with `args`, returning stdout.
///
/// `target` names the repository or URL in error messages.
fn run_git<S: AsRef<str>>(dir: Option<&Path>, args: &[S], target: &str) -> UrResult<Vec<u8>> {
    let args: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
    debug!("Executing: git {:?}", args);

    let mut cmd = Command::new("git");
    if let Some(dir) = dir {
        cmd.current_dir(dir);
    }
    let output = cmd
        .args(&args)
        .env("GIT_TERMINAL_PROMPT", "0")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| UrError::command_failed(format!("git {}", args.join(" ")), e))?;

    if output.status.success() {
        Ok(output.stdout)
    } else {
        Err(UrError::Git {
            command: args
                .iter()
                .find(|a| !a.starts_with('-') && !a.contains('='))
                .unwrap_or(&"")
                .to_string(),
            target: target.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

/// Kind of object a tree entry points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Blob,
    Tree,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blob => write!(f, "blob"),
            Self::Tree => write!(f, "tree"),
        }
    }
}

/// One line of `git ls-tree`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub mode: String,
    pub kind: ObjectKind,
    pub oid: String,
    pub name: String,
}

/// An opened local clone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitRepo {
    dir: PathBuf,
}

impl GitRepo {
    /// Open the working copy at `dir`
    pub fn open(dir: impl Into<PathBuf>) -> UrResult<Self> {
        let dir = dir.into();
        if !dir.join(".git").exists() {
            return Err(UrError::not_found(".git", dir.display().to_string()));
        }
        Ok(Self { dir })
    }

    /// Working-copy directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn git(&self, args: &[&str]) -> UrResult<Vec<u8>> {
        run_git(Some(&self.dir), args, &self.dir.display().to_string())
    }

    fn git_line(&self, args: &[&str]) -> UrResult<String> {
        Ok(String::from_utf8_lossy(&self.git(args)?).trim().to_string())
    }

    /// Full hash of the checked-out commit
    pub fn head(&self) -> UrResult<String> {
        self.git_line(&["rev-parse", "HEAD"])
    }

    /// Tree object id of `rev`
    pub fn tree_of(&self, rev: &str) -> UrResult<String> {
        self.git_line(&["rev-parse", "--verify", "--quiet", &format!("{}^{{tree}}", rev)])
            .map_err(|_| UrError::CommitNotFound {
                commit: rev.to_string(),
                repo: self.dir.display().to_string(),
            })
    }

    /// Blob and subtree entries of tree `oid`; submodule links are skipped
    pub fn list_tree(&self, oid: &str) -> UrResult<Vec<TreeEntry>> {
        let out = self.git(&["ls-tree", "-z", oid])?;
        parse_ls_tree(&out)
    }

    /// Contents of blob `oid`
    pub fn read_blob(&self, oid: &str) -> UrResult<Vec<u8>> {
        self.git(&["cat-file", "blob", oid])
    }

    /// Author e-mail of `rev`
    pub fn author_email(&self, rev: &str) -> UrResult<String> {
        self.git_line(&["log", "-1", "--format=%ae", rev])
    }
}

/// Parse NUL-terminated `git ls-tree -z` output
pub fn parse_ls_tree(out: &[u8]) -> UrResult<Vec<TreeEntry>> {
    let mut entries = Vec::new();
    for record in out.split(|b| *b == 0).filter(|r| !r.is_empty()) {
        let record = String::from_utf8_lossy(record);
        let (meta, name) = record.split_once('\t').ok_or_else(|| {
            UrError::Internal(format!("malformed ls-tree record: {:?}", record))
        })?;
        let mut parts = meta.split(' ');
        let (Some(mode), Some(kind), Some(oid)) = (parts.next(), parts.next(), parts.next()) else {
            return Err(UrError::Internal(format!("malformed ls-tree record: {:?}", record)));
        };
        let kind = match kind {
            "blob" => ObjectKind::Blob,
            "tree" => ObjectKind::Tree,
            _ => continue,
        };
        entries.push(TreeEntry {
            mode: mode.to_string(),
            kind,
            oid: oid.to_string(),
            name: name.to_string(),
        });
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{git_available, init_repo};
    use tempfile::TempDir;

    #[test]
    fn parse_ls_tree_records() {
        let out = b"100644 blob 1111111111111111111111111111111111111111\tREADME.md\0\
040000 tree 2222222222222222222222222222222222222222\tsrc\0\
160000 commit 3333333333333333333333333333333333333333\tvendor\0";

        let entries = parse_ls_tree(out).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, ObjectKind::Blob);
        assert_eq!(entries[0].name, "README.md");
        assert_eq!(entries[1].kind, ObjectKind::Tree);
        assert_eq!(entries[1].oid, "2222222222222222222222222222222222222222");
    }

    #[test]
    fn parse_ls_tree_keeps_tabs_and_spaces_in_names() {
        let out = b"100644 blob 1111111111111111111111111111111111111111\tmy notebook.ipynb\0";
        assert_eq!(parse_ls_tree(out).unwrap()[0].name, "my notebook.ipynb");
    }

    #[test]
    fn parse_ls_tree_rejects_garbage() {
        assert!(parse_ls_tree(b"nonsense\0").is_err());
    }

    #[test]
    fn auth_args_are_scoped_per_prefix() {
        let git = GitCli::with_tokens(vec![("https://github.com/".into(), "t0k".into())]);
        assert_eq!(
            git.auth_args(),
            vec![
                "-c".to_string(),
                "http.https://github.com/.extraHeader=Authorization: Bearer t0k".to_string(),
            ]
        );
        assert!(GitCli::new().auth_args().is_empty());
    }

    #[test]
    fn open_requires_git_dir() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            GitRepo::open(dir.path()),
            Err(UrError::NotFound { .. })
        ));
    }

    #[test]
    fn reads_objects_from_local_repo() {
        if !git_available() {
            return;
        }
        let dir = TempDir::new().unwrap();
        let sha = init_repo(dir.path(), &[("a.py", "print(1)\n"), ("lib/b.py", "x = 2\n")]);

        let repo = GitRepo::open(dir.path()).unwrap();
        assert_eq!(repo.head().unwrap(), sha);
        assert_eq!(repo.author_email(&sha).unwrap(), "ur@example.com");

        let tree = repo.tree_of(&sha).unwrap();
        let entries = repo.list_tree(&tree).unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.py", "lib"]);
        assert_eq!(repo.read_blob(&entries[0].oid).unwrap(), b"print(1)\n");
    }

    #[test]
    fn unknown_commit_is_not_found() {
        if !git_available() {
            return;
        }
        let dir = TempDir::new().unwrap();
        init_repo(dir.path(), &[("a.py", "")]);

        let repo = GitRepo::open(dir.path()).unwrap();
        assert!(matches!(
            repo.tree_of("deadbeef"),
            Err(UrError::CommitNotFound { .. })
        ));
    }

    #[test]
    fn clone_then_pull() {
        if !git_available() {
            return;
        }
        let src = TempDir::new().unwrap();
        let sha = init_repo(src.path(), &[("a.py", "1\n")]);
        let dest = TempDir::new().unwrap();
        let clone = dest.path().join("clone");

        let git = GitCli::new();
        git.clone_repo(&src.path().to_string_lossy(), &clone).unwrap();
        assert_eq!(GitRepo::open(&clone).unwrap().head().unwrap(), sha);

        git.pull(&clone).unwrap();
        assert!(git.clone_repo(&src.path().to_string_lossy(), &clone).is_err());
    }
}
