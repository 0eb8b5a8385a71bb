// warden-core/src/application/passes/dependencies.rs

use crate::domain::finding::{FindingSink, Location, Severity};
use crate::domain::source::SourceFile;
use crate::domain::text::static_regex;
use crate::error::WardenError;
use crate::infrastructure::config::manifest::{MANIFEST_FILE, PackageManifest};
use crate::infrastructure::error::InfrastructureError;
use crate::ports::corpus::ScanFilter;
use crate::ports::validator::{PassSummary, ProjectContext, Validator};
use async_trait::async_trait;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

pub struct DependenciesValidator;

fn re_package_use() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(
        &RE,
        r#"\bfrom\s+['"]([^'"]+)['"]|\brequire\s*\(\s*['"]([^'"]+)['"]\s*\)|\bimport\s*\(\s*['"]([^'"]+)['"]\s*\)|^\s*import\s+['"]([^'"]+)['"]"#,
    )
}

/// `lodash/fp` -> `lodash`, `@scope/pkg/sub` -> `@scope/pkg`. Relative and
/// `node:` specifiers have no package.
pub fn package_root(spec: &str) -> Option<&str> {
    if spec.starts_with('.') || spec.starts_with('/') || spec.starts_with("node:") {
        return None;
    }
    let mut cut = spec.match_indices('/').map(|(idx, _)| idx);
    let end = if spec.starts_with('@') {
        cut.nth(1)
    } else {
        cut.next()
    };
    Some(&spec[..end.unwrap_or(spec.len())])
}

/// Every package imported, required or dynamically imported by `files`.
pub fn imported_packages(files: &[SourceFile]) -> BTreeSet<String> {
    let mut packages = BTreeSet::new();
    for file in files {
        for line in file.content.lines() {
            for caps in re_package_use().captures_iter(line) {
                if let Some(spec) = (1..=4).find_map(|i| caps.get(i))
                    && let Some(root) = package_root(spec.as_str())
                {
                    packages.insert(root.to_string());
                }
            }
        }
    }
    packages
}

#[async_trait]
impl Validator for DependenciesValidator {
    fn name(&self) -> &'static str {
        "dependencies"
    }

    fn description(&self) -> &'static str {
        "Runtime dependencies declared in package.json but never used"
    }

    async fn validate(
        &self,
        ctx: &ProjectContext,
        sink: &mut FindingSink,
    ) -> Result<PassSummary, WardenError> {
        let content = ctx
            .corpus
            .read_optional(MANIFEST_FILE)
            .await?
            .ok_or_else(|| InfrastructureError::MissingFile(MANIFEST_FILE.to_string()))?;
        let manifest = PackageManifest::parse(&content)?;

        let files = ctx.corpus.scan(&ScanFilter::sources(&ctx.config)).await?;
        let used = imported_packages(&files);

        let mut unused = 0;
        for package in manifest.dependencies.keys() {
            if package.starts_with("@types/")
                || used.contains(package)
                || manifest.script_mentions(package)
            {
                continue;
            }
            unused += 1;
            sink.emit(
                Severity::Low,
                "unused-dependency",
                Location::file(MANIFEST_FILE),
                format!("'{}' is never imported nor used by an npm script", package),
            );
        }

        Ok(PassSummary::empty()
            .with_metric("dependencies", manifest.dependencies.len() as f64)
            .with_metric("unused", unused as f64))
    }
}
