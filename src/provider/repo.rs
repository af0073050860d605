//! Repository and commit entities
//!
//! ```text
//! <cache_root>/Gist/<id>/clone/                  git checkout
//! <cache_root>/Gist/<id>/user                    owner login
//! <cache_root>/Github/<org>%2F<repo>/clone/
//! <cache_root>/Commit/<provider>%2F<id>%2F<sha>/author
//! <cache_root>/Commit/gist%2F<id>%2F<sha>/page
//! <cache_root>/Commit/gist%2F<id>%2F<sha>/fragments
//! ```

use crate::cache::{DirectField, Entity, Field, FieldContext, Record, Serializer, Text};
use crate::error::{UrError, UrResult};
use crate::git::GitRepo;
use crate::provider::{gist, Provider};
use crate::services::Services;
use crate::tree::{ContentNode, TreeSource};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// A hosted repository, backed by a local clone
pub struct Repo {
    provider: Provider,
    record: Record,
    services: Arc<Services>,
}

impl Entity for Repo {
    fn record(&self) -> &Record {
        &self.record
    }
}

impl Repo {
    /// Local checkout; cloned on first use, pulled when refreshed
    pub const CLONE: DirectField<Repo, GitRepo> =
        DirectField::new("clone", Repo::download_clone, Repo::open_clone);

    /// Gist owner login, scraped from the head commit's page
    pub const USER: Field<Repo, String> = Field::new("user", Repo::scrape_user);

    pub fn open(
        services: &Arc<Services>,
        provider: Provider,
        id: &str,
        skip_cache: bool,
    ) -> UrResult<Arc<Self>> {
        let record = services.cache.record(provider.type_name(), id, skip_cache)?;
        Ok(Arc::new(Self {
            provider,
            record,
            services: Arc::clone(services),
        }))
    }

    /// Another handle on the same repository, sharing its cache files
    fn reopen(&self) -> UrResult<Arc<Self>> {
        Self::open(&self.services, self.provider, self.id(), self.record.skips_cache())
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn id(&self) -> &str {
        self.key()
    }

    pub fn git_url(&self) -> String {
        self.provider.git_url(self.id())
    }

    pub fn www_url(&self) -> String {
        self.provider.www_url(self.id())
    }

    pub fn module_name(&self) -> String {
        self.provider.module_name(self.id())
    }

    pub fn clone_dir(&self) -> PathBuf {
        self.record.field_path(Self::CLONE.name())
    }

    /// The local clone, cloning first if needed
    pub fn checkout(&self) -> UrResult<GitRepo> {
        self.fetch(&Self::CLONE)
    }

    /// Pull the existing clone
    pub fn refresh(&self) -> UrResult<()> {
        self.services.git.pull(&self.clone_dir())
    }

    /// The commit checked out in the clone
    pub fn head_commit(self: &Arc<Self>) -> UrResult<Arc<Commit>> {
        let sha = self.checkout()?.head()?;
        self.commit(&sha)
    }

    /// Commit `sha`; nothing is fetched until its tree or fields are used
    pub fn commit(self: &Arc<Self>, sha: &str) -> UrResult<Arc<Commit>> {
        let key = format!("{}/{}/{}", self.provider.prefix(), self.id(), sha);
        let record = self
            .services
            .cache
            .record(Commit::TYPE_NAME, &key, self.record.skips_cache())?;
        Ok(Arc::new(Commit {
            repo: Arc::clone(self),
            sha: sha.to_string(),
            record,
        }))
    }

    fn download_clone(ctx: &FieldContext<'_, Repo>) -> UrResult<()> {
        let git = &ctx.entity.services.git;
        if ctx.path.exists() {
            git.pull(ctx.path)
        } else {
            git.clone_repo(&ctx.entity.git_url(), ctx.path)
        }
    }

    fn open_clone(ctx: &FieldContext<'_, Repo>) -> UrResult<GitRepo> {
        GitRepo::open(ctx.path)
    }

    fn scrape_user(&self) -> UrResult<String> {
        if self.provider != Provider::Gist {
            return Err(UrError::Internal(format!(
                "{} repositories have no owner field",
                self.provider
            )));
        }
        let commit = self.reopen()?.head_commit()?;
        let page = commit.fetch(&Commit::PAGE)?;
        gist::scrape_user(&page, &commit.page_url())
    }
}

impl fmt::Display for Repo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.record, f)
    }
}

impl fmt::Debug for Repo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.record, f)
    }
}

/// One commit of a [`Repo`]
pub struct Commit {
    repo: Arc<Repo>,
    sha: String,
    record: Record,
}

impl Entity for Commit {
    fn record(&self) -> &Record {
        &self.record
    }
}

impl Commit {
    pub const TYPE_NAME: &'static str = "Commit";

    /// Author e-mail
    pub const AUTHOR: Field<Commit, String> = Field::new("author", Commit::author_email);

    /// Rendered gist page for this commit
    pub const PAGE: DirectField<Commit, String> =
        DirectField::new("page", Commit::download_page, Commit::read_page);

    /// Gist file anchors (`file-foo-py`) to file names
    pub const FRAGMENTS: Field<Commit, BTreeMap<String, String>> =
        Field::new("fragments", Commit::scrape_fragments);

    pub fn repo(&self) -> &Arc<Repo> {
        &self.repo
    }

    pub fn sha(&self) -> &str {
        &self.sha
    }

    pub fn www_url(&self) -> String {
        self.repo.provider.commit_url(self.repo.id(), &self.sha)
    }

    /// Page scraped for gist metadata; the web view of the commit
    pub fn page_url(&self) -> String {
        self.www_url()
    }

    /// Lazily cloned root of the commit tree
    pub fn root(self: &Arc<Self>) -> ContentNode {
        ContentNode::git_root(Arc::clone(self) as Arc<dyn TreeSource>)
    }

    /// File or directory at `path` in this commit
    pub fn file(self: &Arc<Self>, path: &str) -> UrResult<File> {
        let path = path.trim_matches('/').to_string();
        let node = self.root().locate(&path)?;
        Ok(File {
            commit: Arc::clone(self),
            path,
            node,
        })
    }

    /// Names of the files at the top of the tree
    pub fn file_names(self: &Arc<Self>) -> UrResult<Vec<String>> {
        Ok(self
            .root()
            .children()?
            .into_iter()
            .filter(|(_, node)| node.is_file())
            .map(|(name, _)| name)
            .collect())
    }

    fn author_email(&self) -> UrResult<String> {
        let repo = self.repo.checkout()?;
        self.ensure_present(&repo)?;
        repo.author_email(&self.sha)
    }

    /// Resolve this commit's tree, pulling once if the clone predates it
    fn ensure_present(&self, repo: &GitRepo) -> UrResult<String> {
        match repo.tree_of(&self.sha) {
            Err(UrError::CommitNotFound { .. }) => {
                info!("{} not in clone of {}; pulling", self.sha, self.repo.id());
                self.repo.refresh()?;
                repo.tree_of(&self.sha)
            }
            other => other,
        }
    }

    fn download_page(ctx: &FieldContext<'_, Commit>) -> UrResult<()> {
        ctx.entity
            .repo
            .services
            .http
            .download(&ctx.entity.page_url(), ctx.path)
    }

    fn read_page(ctx: &FieldContext<'_, Commit>) -> UrResult<String> {
        Text::load(ctx.path)
    }

    fn scrape_fragments(&self) -> UrResult<BTreeMap<String, String>> {
        let page = self.fetch(&Self::PAGE)?;
        gist::scrape_fragments(&page, &self.page_url())
    }
}

impl TreeSource for Commit {
    fn url(&self) -> String {
        self.www_url()
    }

    fn open(&self) -> UrResult<(GitRepo, String)> {
        let repo = self.repo.checkout()?;
        let tree = self.ensure_present(&repo)?;
        Ok((repo, tree))
    }
}

impl fmt::Display for Commit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.record, f)
    }
}

impl fmt::Debug for Commit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.record, f)
    }
}

/// A path inside a commit
#[derive(Debug, Clone)]
pub struct File {
    commit: Arc<Commit>,
    path: String,
    node: ContentNode,
}

impl File {
    pub fn commit(&self) -> &Arc<Commit> {
        &self.commit
    }

    /// Path relative to the repository root
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn name(&self) -> &str {
        self.node.name()
    }

    pub fn node(&self) -> &ContentNode {
        &self.node
    }

    pub fn read(&self) -> UrResult<Vec<u8>> {
        self.node.read()
    }

    pub fn read_text(&self) -> UrResult<String> {
        self.node.read_text()
    }

    /// File name without its extension
    pub fn module_name(&self) -> &str {
        let name = self.name();
        name.rsplit_once('.').map_or(name, |(base, _)| base)
    }

    /// Dotted module path, e.g. `github.org.repo.pkg.mod`
    pub fn module_fullname(&self) -> String {
        let mut full = self.commit.repo.module_name();
        let mut segments: Vec<&str> = self.path.split('/').collect();
        segments.pop();
        for segment in segments {
            full.push('.');
            full.push_str(segment);
        }
        full.push('.');
        full.push_str(self.module_name());
        full
    }

    /// Raw-content URL
    pub fn raw_url(&self) -> UrResult<String> {
        let repo = &self.commit.repo;
        let sha = self.commit.sha();
        Ok(match repo.provider {
            Provider::Gist => {
                let user = repo.get(&Repo::USER)?;
                gist::raw_url(&user, repo.id(), sha, &self.path)
            }
            Provider::Github => format!(
                "https://raw.githubusercontent.com/{}/{}/{}",
                repo.id(),
                sha,
                self.path
            ),
            Provider::Gitlab => format!("{}/-/raw/{}/{}", repo.www_url(), sha, self.path),
        })
    }

    /// Web view URL
    pub fn www_url(&self) -> UrResult<String> {
        let repo = &self.commit.repo;
        let sha = self.commit.sha();
        Ok(match repo.provider {
            Provider::Gist => {
                let user = repo.get(&Repo::USER)?;
                let fragments = self.commit.get(&Commit::FRAGMENTS)?;
                let fragment = fragments
                    .iter()
                    .find(|(_, name)| **name == self.path)
                    .map(|(fragment, _)| fragment.clone())
                    .ok_or_else(|| UrError::not_found(&self.path, self.commit.page_url()))?;
                gist::file_url(&user, repo.id(), sha, &fragment)
            }
            Provider::Github => format!("{}/blob/{}/{}", repo.www_url(), sha, self.path),
            Provider::Gitlab => format!("{}/-/blob/{}/{}", repo.www_url(), sha, self.path),
        })
    }
}
