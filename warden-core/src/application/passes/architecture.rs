// warden-core/src/application/passes/architecture.rs

use crate::domain::finding::{FindingSink, Location, Severity};
use crate::domain::graph::{ImportGraph, linkages};
use crate::domain::text::static_regex;
use crate::error::WardenError;
use crate::ports::corpus::ScanFilter;
use crate::ports::validator::{PassSummary, ProjectContext, Validator};
use async_trait::async_trait;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

pub struct ArchitectureValidator;

/// Targets the presentation layer must never link to, whatever the layer table says.
fn re_backend_target() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(
        &RE,
        r"(^|/)(services|repositories|db|controllers)(/|$)|^@supabase/supabase-js$",
    )
}

#[async_trait]
impl Validator for ArchitectureValidator {
    fn name(&self) -> &'static str {
        "architecture"
    }

    fn description(&self) -> &'static str {
        "Layer boundaries, directory hygiene, duplicate file names and circular imports"
    }

    async fn validate(
        &self,
        ctx: &ProjectContext,
        sink: &mut FindingSink,
    ) -> Result<PassSummary, WardenError> {
        let config = &ctx.config;
        let files = ctx.corpus.scan(&ScanFilter::sources(config)).await?;
        let graph = ImportGraph::build(&files, &config.default_extension);

        // 1. Layer table
        for (from, to, line) in graph.edges() {
            let (Some(from_layer), Some(to_layer)) = (config.layer_of(from), config.layer_of(to))
            else {
                continue;
            };
            if !config.may_depend(from_layer, to_layer) {
                sink.emit(
                    Severity::High,
                    "layering",
                    Location::line(from, line),
                    format!(
                        "{} layer must not depend on {} layer (imports {})",
                        from_layer, to_layer, to
                    ),
                );
            }
        }

        // 2. Prohibited directories, at the root and directly under each source dir
        let mut bases = vec![String::new()];
        bases.extend(config.source_dirs.iter().cloned());
        for base in &bases {
            for dir in &config.prohibited_dirs {
                let rel = if base.is_empty() {
                    dir.clone()
                } else {
                    format!("{}/{}", base.trim_end_matches('/'), dir)
                };
                if ctx.corpus.is_dir(&rel) {
                    sink.emit(
                        Severity::Medium,
                        "structure",
                        Location::file(rel.clone()),
                        format!("Prohibited directory '{}'", rel),
                    );
                }
            }
        }

        // 3. Duplicate basenames
        let mut by_basename: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for file in &files {
            by_basename
                .entry(file.file_name())
                .or_default()
                .push(file.rel_path.as_str());
        }
        for (basename, paths) in &by_basename {
            if paths.len() < 2 || config.duplicate_allowed(basename) {
                continue;
            }
            sink.emit(
                Severity::Low,
                "structure",
                Location::file(paths[0]),
                format!(
                    "File name '{}' is used {} times: {}",
                    basename,
                    paths.len(),
                    paths.join(", ")
                ),
            );
        }

        // 4. Presentation code reaching into the backend
        for file in files.iter().filter(|f| config.is_presentation(&f.rel_path)) {
            for linkage in linkages(&file.content) {
                if re_backend_target().is_match(&linkage.spec) {
                    sink.emit(
                        Severity::High,
                        "boundary",
                        Location::line(file.rel_path.clone(), linkage.line),
                        format!("Presentation code imports backend module '{}'", linkage.spec),
                    );
                }
            }
        }

        // 5. Two-file cycles
        let pairs = graph.mutual_pairs();
        for (a, b) in &pairs {
            sink.emit(
                Severity::High,
                "circular-dependency",
                Location::file(a.clone()),
                format!("Circular import between {} and {}", a, b),
            );
        }

        Ok(PassSummary::empty()
            .with_metric("files", files.len() as f64)
            .with_metric("import_edges", graph.edge_count() as f64)
            .with_metric("cycles", pairs.len() as f64))
    }
}
