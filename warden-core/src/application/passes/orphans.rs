// warden-core/src/application/passes/orphans.rs

use crate::application::passes::html_references::{RefKind, references};
use crate::domain::finding::{FindingSink, Location, Severity};
use crate::domain::graph::ImportGraph;
use crate::error::WardenError;
use crate::ports::corpus::ScanFilter;
use crate::ports::validator::{PassSummary, ProjectContext, Validator};
use async_trait::async_trait;
use std::collections::BTreeSet;

pub struct OrphansValidator;

#[async_trait]
impl Validator for OrphansValidator {
    fn name(&self) -> &'static str {
        "orphans"
    }

    fn description(&self) -> &'static str {
        "Source files nothing imports, references or starts"
    }

    async fn validate(
        &self,
        ctx: &ProjectContext,
        sink: &mut FindingSink,
    ) -> Result<PassSummary, WardenError> {
        let config = &ctx.config;
        let files = ctx.corpus.scan(&ScanFilter::sources(config)).await?;
        let graph = ImportGraph::build(&files, &config.default_extension);

        let pages = ctx
            .corpus
            .scan(&ScanFilter::everywhere(&["html", "htm"]))
            .await?;
        let scripts: BTreeSet<String> = pages
            .iter()
            .flat_map(|page| references(page))
            .filter(|r| r.kind == RefKind::Script)
            .map(|r| r.resolved)
            .collect();

        let mut orphans = 0;
        for file in &files {
            let rel = file.rel_path.as_str();
            let exempt = file.is_test()
                || file.is_declaration()
                || config.entry_points.iter().any(|e| e == rel)
                || scripts.contains(rel);
            if exempt || !graph.importers_of(rel).is_empty() {
                continue;
            }
            orphans += 1;
            sink.emit(
                Severity::Low,
                "orphan",
                Location::file(rel),
                "Not imported by any file, not an entry point and not referenced from HTML",
            );
        }

        Ok(PassSummary::empty()
            .with_metric("files", files.len() as f64)
            .with_metric("orphans", orphans as f64))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::application::passes::testing_support::{project, run_pass};
    use anyhow::Result;

    #[tokio::test]
    async fn test_only_unreferenced_files_are_orphans() -> Result<()> {
        let (_dir, ctx) = project(&[
            ("src/server.ts", "import { app } from './app';\n"),
            ("src/app.ts", "export const app = 1;\n"),
            ("src/unused.ts", "export const nobody = 1;\n"),
            ("src/app.test.ts", "import { app } from './app';\n"),
            ("src/types/global.d.ts", "declare const X: string;\n"),
            ("public/js/main.js", "document.title = 'x';\n"),
            ("public/index.html", "<script src=\"/js/main.js\"></script>\n"),
        ])?;
        let (sink, summary) = run_pass(&OrphansValidator, &ctx).await?;

        let files: Vec<_> = sink.findings().iter().map(|f| f.file.as_str()).collect();
        assert_eq!(files, vec!["src/unused.ts"]);
        assert_eq!(summary.metrics["orphans"], 1.0);
        Ok(())
    }
}
