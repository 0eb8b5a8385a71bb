// warden-core/src/domain/source.rs

use std::path::PathBuf;

/// One scanned file. `rel_path` (project-relative, `/`-separated) is the identity
/// used by the import graph and by findings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub rel_path: String,
    pub content: String,
    pub extension: String,
}

impl SourceFile {
    pub fn new(path: PathBuf, rel_path: impl Into<String>, content: impl Into<String>) -> Self {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        Self {
            path,
            rel_path: rel_path.into(),
            content: content.into(),
            extension,
        }
    }

    /// In-memory file, mostly for tests and for re-analysing planned rewrites.
    pub fn virtual_file(rel_path: &str, content: impl Into<String>) -> Self {
        Self::new(PathBuf::from(rel_path), rel_path, content)
    }

    /// `(1-based line number, line)` pairs.
    pub fn numbered_lines(&self) -> impl Iterator<Item = (usize, &str)> {
        self.content.lines().enumerate().map(|(i, l)| (i + 1, l))
    }

    pub fn file_name(&self) -> &str {
        self.rel_path.rsplit('/').next().unwrap_or(&self.rel_path)
    }

    /// File name without its final extension (`order.service.ts` -> `order.service`).
    pub fn stem(&self) -> &str {
        let name = self.file_name();
        match name.rfind('.') {
            Some(idx) if idx > 0 => &name[..idx],
            _ => name,
        }
    }

    /// Stem with test markers removed (`cart.test.ts` -> `cart`).
    pub fn subject_stem(&self) -> &str {
        let stem = self.stem();
        stem.strip_suffix(".test")
            .or_else(|| stem.strip_suffix(".spec"))
            .unwrap_or(stem)
    }

    /// Directory part of `rel_path`, empty for files at the root.
    pub fn dir(&self) -> &str {
        match self.rel_path.rfind('/') {
            Some(idx) => &self.rel_path[..idx],
            None => "",
        }
    }

    pub fn is_under(&self, prefix: &str) -> bool {
        is_under(&self.rel_path, prefix)
    }

    pub fn is_test(&self) -> bool {
        let stem = self.stem();
        stem.ends_with(".test")
            || stem.ends_with(".spec")
            || self
                .rel_path
                .split('/')
                .any(|seg| seg == "tests" || seg == "__tests__")
    }

    pub fn is_declaration(&self) -> bool {
        self.file_name().ends_with(".d.ts")
    }

    pub fn is_typescript(&self) -> bool {
        matches!(self.extension.as_str(), "ts" | "tsx")
    }

    pub fn is_markup(&self) -> bool {
        matches!(self.extension.as_str(), "html" | "htm" | "tsx" | "jsx")
    }
}

/// Segment-aware prefix test: `src/services` covers `src/services/a.ts` but not `src/servicesX`.
pub fn is_under(rel_path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() || prefix == "." {
        return true;
    }
    rel_path == prefix
        || rel_path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_helpers() {
        let file = SourceFile::virtual_file("src/services/order.service.ts", "");
        assert_eq!(file.file_name(), "order.service.ts");
        assert_eq!(file.stem(), "order.service");
        assert_eq!(file.dir(), "src/services");
        assert_eq!(file.extension, "ts");
        assert!(file.is_under("src/services"));
        assert!(!file.is_under("src/serv"));
        assert!(!file.is_test());
    }

    #[test]
    fn test_test_detection() {
        assert!(SourceFile::virtual_file("src/cart.test.ts", "").is_test());
        assert!(SourceFile::virtual_file("src/cart.spec.tsx", "").is_test());
        assert!(SourceFile::virtual_file("tests/helpers.ts", "").is_test());
        assert_eq!(
            SourceFile::virtual_file("src/cart.test.ts", "").subject_stem(),
            "cart"
        );
        assert!(SourceFile::virtual_file("src/types/global.d.ts", "").is_declaration());
    }

    #[test]
    fn test_numbered_lines_are_one_based() {
        let file = SourceFile::virtual_file("a.ts", "first\nsecond");
        let lines: Vec<_> = file.numbered_lines().collect();
        assert_eq!(lines, vec![(1, "first"), (2, "second")]);
    }
}
