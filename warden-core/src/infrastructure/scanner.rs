// warden-core/src/infrastructure/scanner.rs

use crate::domain::project::ProjectConfig;
use crate::domain::source::SourceFile;
use crate::error::WardenError;
use crate::infrastructure::error::InfrastructureError;
use crate::ports::corpus::{CorpusSource, ScanFilter};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Filesystem implementation of the corpus port.
///
/// Nothing is cached: every `scan` walks the tree again, so a pass always sees
/// the files as they are on disk when it runs.
#[derive(Debug, Clone)]
pub struct FsCorpus {
    root: PathBuf,
    exclude_dirs: Vec<String>,
}

impl FsCorpus {
    pub fn new(root: impl Into<PathBuf>, config: &ProjectConfig) -> Self {
        Self {
            root: root.into(),
            exclude_dirs: config.exclude_dirs.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn is_excluded(&self, entry: &DirEntry) -> bool {
        entry.depth() > 0
            && entry.file_type().is_dir()
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| self.exclude_dirs.iter().any(|d| d == name))
    }

    /// Sorted, depth-first walk of `start` with excluded directories pruned.
    fn walk(&self, start: &Path) -> impl Iterator<Item = Result<DirEntry, walkdir::Error>> + '_ {
        WalkDir::new(start)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |e| !self.is_excluded(e))
    }

    fn rel_path(&self, path: &Path) -> String {
        let rel = path.strip_prefix(&self.root).unwrap_or(path);
        rel.components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Joins a project-relative path onto the root, refusing anything that climbs out.
    fn resolve(&self, rel_path: &str) -> Result<PathBuf, WardenError> {
        let rel = Path::new(rel_path);
        let escapes = rel
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)));
        if escapes {
            return Err(WardenError::UnsafePath(rel_path.to_string()));
        }
        Ok(self.root.join(rel))
    }

    fn starts(&self, dirs: &[String]) -> Result<Vec<PathBuf>, WardenError> {
        if dirs.is_empty() {
            return Ok(vec![self.root.clone()]);
        }
        dirs.iter()
            .map(|d| self.resolve(d.trim_start_matches("./")))
            .collect()
    }
}

#[async_trait]
impl CorpusSource for FsCorpus {
    async fn scan(&self, filter: &ScanFilter) -> Result<Vec<SourceFile>, WardenError> {
        let mut files = Vec::new();
        let mut seen = BTreeSet::new();

        for start in self.starts(&filter.dirs)? {
            if !start.exists() {
                debug!(dir = ?start, "Scan root absent, skipping");
                continue;
            }
            for entry in self.walk(&start) {
                let entry = entry.map_err(InfrastructureError::from)?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let extension = entry
                    .path()
                    .extension()
                    .map(|e| e.to_string_lossy().to_lowercase())
                    .unwrap_or_default();
                if !filter.accepts_extension(&extension) {
                    continue;
                }
                let rel = self.rel_path(entry.path());
                if !seen.insert(rel.clone()) {
                    continue;
                }
                let bytes = tokio::fs::read(entry.path())
                    .await
                    .map_err(InfrastructureError::from)?;
                let content = String::from_utf8_lossy(&bytes).into_owned();
                files.push(SourceFile::new(entry.path().to_path_buf(), rel, content));
            }
        }

        Ok(files)
    }

    async fn list(
        &self,
        dir: &str,
        extensions: &[&str],
    ) -> Result<Vec<(String, u64)>, WardenError> {
        let start = self.resolve(dir)?;
        if !start.is_dir() {
            return Ok(vec![]);
        }
        let filter = ScanFilter::new(&[], extensions);
        let mut listed = Vec::new();
        for entry in self.walk(&start) {
            let entry = entry.map_err(InfrastructureError::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let extension = entry
                .path()
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase())
                .unwrap_or_default();
            if !filter.accepts_extension(&extension) {
                continue;
            }
            let size = entry
                .metadata()
                .map_err(InfrastructureError::from)?
                .len();
            listed.push((self.rel_path(entry.path()), size));
        }
        Ok(listed)
    }

    async fn read_optional(&self, rel_path: &str) -> Result<Option<String>, WardenError> {
        let path = self.resolve(rel_path)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(file = rel_path, "Optional collaborator absent");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn exists(&self, rel_path: &str) -> bool {
        self.resolve(rel_path).is_ok_and(|p| p.exists())
    }

    fn is_dir(&self, rel_path: &str) -> bool {
        self.resolve(rel_path).is_ok_and(|p| p.is_dir())
    }
}
