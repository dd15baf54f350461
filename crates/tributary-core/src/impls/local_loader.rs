//! LocalObjectLoader - ローカルディレクトリを object store とみなす ObjectLoader
//!
//! - `s3://bucket/key` → `<root>/bucket/key`
//! - `file://path` → `path`（そのまま）
//!
//! `..` を含む key は root の外を指すので拒否する。

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use crate::domain::{DEFAULT_SCHEME, LoadError, Locator};
use crate::ports::ObjectLoader;

pub struct LocalObjectLoader {
    root: PathBuf,
    schemes: Vec<String>,
}

impl LocalObjectLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            schemes: vec![DEFAULT_SCHEME.to_string()],
        }
    }

    /// root に対応づける scheme を追加する
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.schemes.push(scheme.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, uri: &str) -> Result<PathBuf, LoadError> {
        if let Some(path) = uri.strip_prefix("file://") {
            return Ok(PathBuf::from(path));
        }

        let locator: Locator = uri
            .parse()
            .map_err(|_| LoadError::InvalidLocator(uri.to_string()))?;
        if !self.schemes.iter().any(|s| s == locator.scheme()) {
            return Err(LoadError::UnsupportedScheme(uri.to_string()));
        }

        let relative = Path::new(locator.bucket()).join(locator.key());
        let escapes_root = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if escapes_root || locator.key().is_empty() {
            return Err(LoadError::InvalidLocator(uri.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectLoader for LocalObjectLoader {
    async fn load(&self, uri: &str) -> Result<Vec<u8>, LoadError> {
        let path = self.resolve(uri)?;
        tokio::fs::read(&path).await.map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                LoadError::NotFound(uri.to_string())
            } else {
                LoadError::Io {
                    uri: uri.to_string(),
                    source,
                }
            }
        })
    }
}
