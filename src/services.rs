//! Process-wide collaborators handed to every resolver

use crate::cache::CacheManager;
use crate::config::Config;
use crate::git::{GitCli, GitClient};
use crate::http::{HttpClient, UreqClient};
use std::path::PathBuf;
use std::sync::Arc;

/// Cache manager plus the network clients entities fetch through.
///
/// Created once at startup and shared as `Arc<Services>`; [`Services::flush`]
/// runs at exit.
pub struct Services {
    pub cache: CacheManager,
    pub git: Arc<dyn GitClient>,
    pub http: Arc<dyn HttpClient>,
}

impl Services {
    pub fn new(cache: CacheManager, git: Arc<dyn GitClient>, http: Arc<dyn HttpClient>) -> Arc<Self> {
        Arc::new(Self { cache, git, http })
    }

    /// Real clients configured from `config`.
    ///
    /// `cache_root` (CLI flag or `UR_CACHE_ROOT`) beats `[cache] root`, which
    /// beats `.objs`; `skip_cache`, `[cache] skip` and `UR_SKIP_CACHE` each
    /// turn skipping on.
    pub fn from_config(config: &Config, cache_root: Option<PathBuf>, skip_cache: bool) -> Arc<Self> {
        let root = cache_root
            .or_else(|| config.cache.root.clone())
            .unwrap_or_else(CacheManager::default_root);
        let skip = skip_cache || config.cache.skip || CacheManager::skip_from_env();

        let tokens = config.auth.url_tokens();
        Self::new(
            CacheManager::new(root).with_skip_cache(skip),
            Arc::new(GitCli::with_tokens(tokens.clone())),
            Arc::new(UreqClient::with_tokens(tokens)),
        )
    }

    pub fn flush(&self) {
        self.cache.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::DEFAULT_CACHE_DIR;
    use serial_test::serial;

    #[test]
    #[serial]
    fn cache_root_precedence() {
        std::env::remove_var(crate::cache::CACHE_ROOT_ENV);
        let mut config = Config::default();

        let services = Services::from_config(&config, None, false);
        assert_eq!(services.cache.root(), PathBuf::from(DEFAULT_CACHE_DIR));

        config.cache.root = Some(PathBuf::from("/from/config"));
        let services = Services::from_config(&config, None, false);
        assert_eq!(services.cache.root(), PathBuf::from("/from/config"));

        let services = Services::from_config(&config, Some(PathBuf::from("/from/flag")), false);
        assert_eq!(services.cache.root(), PathBuf::from("/from/flag"));
    }

    #[test]
    #[serial]
    fn skip_cache_sources() {
        std::env::remove_var(crate::cache::SKIP_CACHE_ENV);
        let mut config = Config::default();
        assert!(!Services::from_config(&config, None, false).cache.skips_cache());
        assert!(Services::from_config(&config, None, true).cache.skips_cache());

        config.cache.skip = true;
        assert!(Services::from_config(&config, None, false).cache.skips_cache());
    }
}
