// warden-core/src/application/passes/build_output.rs

use crate::domain::finding::{FindingSink, Location, Severity};
use crate::domain::source::{SourceFile, is_under};
use crate::error::WardenError;
use crate::infrastructure::config::tsconfig::{TSCONFIG_FILE, TsConfig, include_base};
use crate::ports::corpus::ScanFilter;
use crate::ports::validator::{PassSummary, ProjectContext, Validator};
use async_trait::async_trait;
use tracing::debug;

pub struct BuildOutputValidator;

/// Where the compiler emits `source`: the path relative to `root_dir`, under
/// `out_dir`, with a `.js` extension.
pub fn emitted_path(source: &SourceFile, root_dir: &str, out_dir: &str) -> String {
    let relative = if root_dir.is_empty() {
        source.rel_path.as_str()
    } else {
        source
            .rel_path
            .strip_prefix(root_dir)
            .map(|r| r.trim_start_matches('/'))
            .unwrap_or(&source.rel_path)
    };
    let without_ext = relative
        .strip_suffix(&format!(".{}", source.extension))
        .unwrap_or(relative);
    format!("{}/{}.js", out_dir, without_ext)
}

/// Common root of the compiled sources: `rootDir` when set, else the single
/// include base, else the project root.
fn source_root<'a>(tsconfig: &'a TsConfig, bases: &[&'a str]) -> &'a str {
    match tsconfig.compiler_options.root_dir.as_deref() {
        Some(dir) => dir.trim_start_matches("./").trim_end_matches('/'),
        None => match bases {
            [single] => *single,
            _ => "",
        },
    }
}

#[async_trait]
impl Validator for BuildOutputValidator {
    fn name(&self) -> &'static str {
        "build-output"
    }

    fn description(&self) -> &'static str {
        "Compiler configuration and completeness of the emitted build"
    }

    async fn validate(
        &self,
        ctx: &ProjectContext,
        sink: &mut FindingSink,
    ) -> Result<PassSummary, WardenError> {
        let config = &ctx.config;
        let tsconfig = match ctx.corpus.read_optional(TSCONFIG_FILE).await? {
            Some(content) => TsConfig::parse(&content)?,
            None => {
                sink.emit(
                    Severity::Medium,
                    "tsconfig",
                    Location::project(),
                    "No tsconfig.json found",
                );
                TsConfig::default()
            }
        };

        let out_dir = match tsconfig.out_dir() {
            Some(dir) if !dir.is_empty() => dir.to_string(),
            _ => {
                sink.emit(
                    Severity::Medium,
                    "tsconfig",
                    Location::file(TSCONFIG_FILE),
                    format!(
                        "compilerOptions.outDir is not set; assuming '{}'",
                        config.build_dir
                    ),
                );
                config.build_dir.clone()
            }
        };

        let mut bases: Vec<&str> = tsconfig.include.iter().map(|p| include_base(p)).collect();
        bases.dedup();
        for base in bases.iter().filter(|b| !b.is_empty()) {
            if !ctx.corpus.is_dir(base) {
                sink.emit(
                    Severity::Medium,
                    "tsconfig",
                    Location::file(TSCONFIG_FILE),
                    format!("include entry '{}' points at a missing directory", base),
                );
            }
            if is_under(&out_dir, base) {
                sink.emit(
                    Severity::Medium,
                    "tsconfig",
                    Location::file(TSCONFIG_FILE),
                    format!(
                        "outDir '{}' lies inside included directory '{}'",
                        out_dir, base
                    ),
                );
            }
        }

        if !ctx.corpus.is_dir(&out_dir) {
            sink.emit(
                Severity::High,
                "build",
                Location::file(out_dir.as_str()),
                format!("Build directory '{}' does not exist; run the build", out_dir),
            );
            return Ok(PassSummary::empty().with_metric("compiled_sources", 0.0));
        }

        let filter = if bases.is_empty() || bases.iter().any(|b| b.is_empty()) {
            ScanFilter::everywhere(&["ts", "tsx"])
        } else {
            ScanFilter::new(&bases, &["ts", "tsx"])
        };
        let excluded: Vec<&str> = tsconfig.exclude.iter().map(|p| include_base(p)).collect();
        let sources: Vec<SourceFile> = ctx
            .corpus
            .scan(&filter)
            .await?
            .into_iter()
            .filter(|f| !f.is_declaration())
            .filter(|f| !is_under(&f.rel_path, &out_dir))
            .filter(|f| !excluded.iter().any(|e| !e.is_empty() && f.is_under(e)))
            .collect();
        debug!(count = sources.len(), out_dir = %out_dir, "Checking emitted files");

        let root = source_root(&tsconfig, &bases);
        let mut missing = 0;
        for source in &sources {
            let emitted = emitted_path(source, root, &out_dir);
            if ctx.corpus.exists(&emitted) {
                continue;
            }
            missing += 1;
            sink.emit(
                Severity::Medium,
                "build",
                Location::file(source.rel_path.clone()),
                format!("No compiled output at {}", emitted),
            );
        }

        Ok(PassSummary::empty()
            .with_metric("compiled_sources", sources.len() as f64)
            .with_metric("missing_outputs", missing as f64))
    }
}
