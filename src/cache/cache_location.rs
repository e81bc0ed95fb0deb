use std::path::{Path, PathBuf};

/// Environment variable overriding the shared cache directory
pub const CACHE_DIR_ENV: &str = "JARLOOM_CACHE_DIR";

/// Strategy for cache storage location
#[derive(Debug, Clone, PartialEq)]
pub enum CacheStrategy {
    /// Store artifacts in the platform cache directory (default)
    Shared,
    /// Store artifacts under `JARLOOM_CACHE_DIR`
    Custom(PathBuf),
    /// Store artifacts exactly where the configuration says
    Configured(PathBuf),
}

/// Resolved cache root for one pipeline identity (`<kind>-<version>`).
#[derive(Debug, Clone)]
pub struct CacheLocation {
    pub strategy: CacheStrategy,
    pub base_path: PathBuf,
}

impl CacheLocation {
    /// Resolve the cache root: an explicit directory wins, then the
    /// environment, then the shared platform directory.
    pub fn resolve(configured: Option<&Path>, kind: &str, version: &str) -> Self {
        let strategy = if let Some(dir) = configured {
            CacheStrategy::Configured(dir.to_path_buf())
        } else if let Some(dir) = std::env::var_os(CACHE_DIR_ENV) {
            CacheStrategy::Custom(PathBuf::from(dir))
        } else {
            CacheStrategy::Shared
        };

        let project = format!("{}-{}", kind, version);
        let base_path = match &strategy {
            CacheStrategy::Configured(path) => path.clone(),
            CacheStrategy::Custom(path) => path.join(&project),
            CacheStrategy::Shared => Self::shared_cache_dir().join(&project),
        };

        log::debug!("Using cache root {} ({:?})", base_path.display(), strategy);
        Self {
            strategy,
            base_path,
        }
    }

    /// Platform cache directory, falling back to the temp directory
    fn shared_cache_dir() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("jarloom")
    }

    pub fn get_cache_path(&self) -> &Path {
        &self.base_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_configured_dir_wins() {
        let temp_dir = TempDir::new().unwrap();
        let location = CacheLocation::resolve(Some(temp_dir.path()), "minecraft", "1.16.5");
        assert_eq!(location.base_path, temp_dir.path());
        assert!(matches!(location.strategy, CacheStrategy::Configured(_)));
    }

    #[test]
    fn test_cache_strategy_from_env() {
        let temp_dir = TempDir::new().unwrap();
        env::set_var(CACHE_DIR_ENV, temp_dir.path());
        let location = CacheLocation::resolve(None, "minecraft", "1.16.5");
        env::remove_var(CACHE_DIR_ENV);

        assert!(matches!(location.strategy, CacheStrategy::Custom(_)));
        assert_eq!(location.base_path, temp_dir.path().join("minecraft-1.16.5"));
    }
}
