// warden-core/src/ports/corpus.rs

// What a pass may ask of the project tree. Passes never touch the filesystem
// directly; the orchestrator hands them an implementation of this port.

use crate::domain::project::ProjectConfig;
use crate::domain::source::SourceFile;
use crate::error::WardenError;
use async_trait::async_trait;

/// Which files a scan yields. An empty `dirs` list walks the whole project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanFilter {
    pub dirs: Vec<String>,
    pub extensions: Vec<String>,
}

impl ScanFilter {
    pub fn new(dirs: &[&str], extensions: &[&str]) -> Self {
        Self {
            dirs: dirs.iter().map(|s| s.to_string()).collect(),
            extensions: extensions.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// The configured source directories and extensions.
    pub fn sources(config: &ProjectConfig) -> Self {
        Self {
            dirs: config.source_dirs.clone(),
            extensions: config.extensions.clone(),
        }
    }

    /// The configured source directories, restricted to `extensions`.
    pub fn sources_with(config: &ProjectConfig, extensions: &[&str]) -> Self {
        Self {
            dirs: config.source_dirs.clone(),
            extensions: extensions.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Files with the given extensions anywhere in the project.
    pub fn everywhere(extensions: &[&str]) -> Self {
        Self::new(&[], extensions)
    }

    pub fn accepts_extension(&self, extension: &str) -> bool {
        self.extensions.is_empty()
            || self
                .extensions
                .iter()
                .any(|e| e.trim_start_matches('.').eq_ignore_ascii_case(extension))
    }
}

#[async_trait]
pub trait CorpusSource: Send + Sync {
    /// Walks the tree again on every call, sorted by file name.
    async fn scan(&self, filter: &ScanFilter) -> Result<Vec<SourceFile>, WardenError>;

    /// `(rel_path, size in bytes)` for files under `dir`, without reading them.
    async fn list(&self, dir: &str, extensions: &[&str])
    -> Result<Vec<(String, u64)>, WardenError>;

    /// Content of a project-relative file; `None` when it does not exist.
    async fn read_optional(&self, rel_path: &str) -> Result<Option<String>, WardenError>;

    fn exists(&self, rel_path: &str) -> bool;

    fn is_dir(&self, rel_path: &str) -> bool;
}
