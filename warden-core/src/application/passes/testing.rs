// warden-core/src/application/passes/testing.rs

use crate::application::passes::PASS_MARK;
use crate::application::passes::security::re_hardcoded_secret;
use crate::domain::finding::{FindingSink, Location, Severity};
use crate::domain::scoring::{BUCKET_FACTOR, CategoryScore, ScoreCard, blend};
use crate::domain::source::SourceFile;
use crate::domain::text::{block_end, is_comment_line, static_regex};
use crate::error::WardenError;
use crate::infrastructure::config::pipelines::load_pipelines;
use crate::ports::corpus::ScanFilter;
use crate::ports::validator::{PassSummary, ProjectContext, Validator};
use async_trait::async_trait;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;
use tracing::debug;

pub const COVERAGE_WEIGHT: f64 = 40.0;
pub const QUALITY_WEIGHT: f64 = 30.0;
pub const STRUCTURE_WEIGHT: f64 = 30.0;

pub struct TestingValidator;

fn re_assertion() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r"\b(expect|assert)\w*\s*[(.]|\.should\b")
}

fn re_test_case() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r"^\s*(it|test)(\.only|\.skip)?\s*\(")
}

fn re_setup() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r"\bbefore(Each|All)\s*\(")
}

fn re_teardown() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r"\bafter(Each|All)\s*\(")
}

fn inspect_test_file(test: &SourceFile, max_lines: usize, sink: &mut FindingSink) {
    let rel = test.rel_path.clone();

    if !re_assertion().is_match(&test.content) {
        sink.emit(
            Severity::Medium,
            "quality",
            Location::file(rel.clone()),
            "Test file contains no assertions",
        );
    }

    let lines: Vec<&str> = test.content.lines().collect();
    for (idx, line) in lines.iter().enumerate() {
        if !re_test_case().is_match(line) {
            continue;
        }
        if let Some(end) = block_end(&lines, idx) {
            let length = end - idx + 1;
            if length > max_lines {
                sink.emit(
                    Severity::Low,
                    "quality",
                    Location::line(rel.clone(), idx + 1),
                    format!("Test body spans {} lines (limit {})", length, max_lines),
                );
            }
        }
    }

    for (no, line) in test.numbered_lines() {
        if !is_comment_line(line) && re_hardcoded_secret().is_match(line) {
            sink.emit(
                Severity::Medium,
                "quality",
                Location::line(rel.clone(), no),
                "Hard-coded credential in test",
            );
        }
    }

    if re_setup().is_match(&test.content) && !re_teardown().is_match(&test.content) {
        sink.emit(
            Severity::Low,
            "structure",
            Location::file(rel),
            "Setup hooks without matching teardown",
        );
    }
}

#[async_trait]
impl Validator for TestingValidator {
    fn name(&self) -> &'static str {
        "testing"
    }

    fn description(&self) -> &'static str {
        "Test coverage, test quality and CI pipeline structure"
    }

    async fn validate(
        &self,
        ctx: &ProjectContext,
        sink: &mut FindingSink,
    ) -> Result<PassSummary, WardenError> {
        let config = &ctx.config;
        let extensions: Vec<&str> = config.extensions.iter().map(String::as_str).collect();
        let files = ctx
            .corpus
            .scan(&ScanFilter::everywhere(&extensions))
            .await?;

        let (tests, others): (Vec<&SourceFile>, Vec<&SourceFile>) =
            files.iter().partition(|f| f.is_test());
        let sources: Vec<&SourceFile> = others
            .into_iter()
            .filter(|f| !f.is_declaration())
            .filter(|f| config.source_dirs.iter().any(|d| f.is_under(d)))
            .collect();

        // 1. Coverage by name
        let tested: BTreeSet<&str> = tests.iter().map(|t| t.subject_stem()).collect();
        let mut covered = 0;
        for source in &sources {
            if tested.contains(source.stem()) {
                covered += 1;
            } else {
                sink.emit(
                    Severity::Low,
                    "coverage",
                    Location::file(source.rel_path.clone()),
                    format!("No test file for '{}'", source.stem()),
                );
            }
        }

        // 2. Test quality
        for test in &tests {
            inspect_test_file(test, config.thresholds.max_test_lines, sink);
        }

        // 3. CI pipelines
        let pipelines = load_pipelines(ctx.corpus.as_ref()).await?;
        debug!(count = pipelines.len(), "CI pipelines found");
        match pipelines.first() {
            None => sink.emit(
                Severity::High,
                "structure",
                Location::project(),
                "No CI pipeline definition found",
            ),
            Some(first) => {
                if !pipelines
                    .iter()
                    .any(|p| p.mentions(&["test", "jest", "vitest", "mocha"]))
                {
                    sink.emit(
                        Severity::Medium,
                        "structure",
                        Location::file(first.path.clone()),
                        "CI pipeline never runs the tests",
                    );
                }
                if !pipelines.iter().any(|p| p.mentions(&["coverage"])) {
                    sink.emit(
                        Severity::Medium,
                        "structure",
                        Location::file(first.path.clone()),
                        "CI pipeline does not collect coverage",
                    );
                }
            }
        }

        // 4. Scores
        let coverage = if sources.is_empty() {
            100.0
        } else {
            100.0 * covered as f64 / sources.len() as f64
        };
        let coverage_score = CategoryScore::from_score(
            "coverage",
            (sources.len() - covered) as f64,
            coverage,
        );
        let quality = CategoryScore::from_findings("quality", sink.in_category("quality"), BUCKET_FACTOR);
        let structure =
            CategoryScore::from_findings("structure", sink.in_category("structure"), BUCKET_FACTOR);
        let overall = blend(&[
            (coverage_score.normalized_score, COVERAGE_WEIGHT),
            (quality.normalized_score, QUALITY_WEIGHT),
            (structure.normalized_score, STRUCTURE_WEIGHT),
        ]);
        let card = ScoreCard::new(vec![coverage_score, quality, structure], overall);

        let ratio = if sources.is_empty() {
            0.0
        } else {
            tests.len() as f64 / sources.len() as f64
        };
        let summary = PassSummary::empty()
            .with_metric("test_files", tests.len() as f64)
            .with_metric("source_files", sources.len() as f64)
            .with_metric("test_ratio", ratio)
            .scored(&card);
        Ok(if card.overall < PASS_MARK {
            summary.failing()
        } else {
            summary
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::application::passes::testing_support::{project, run_pass};
    use anyhow::Result;

    const CI: &str = "jobs:\n  test:\n    steps:\n      - run: npm test -- --coverage\n";

    #[tokio::test]
    async fn test_coverage_and_ci() -> Result<()> {
        let (_dir, ctx) = project(&[
            ("src/cart.ts", "export const cart = 1;\n"),
            ("src/order.ts", "export const order = 1;\n"),
            (
                "tests/cart.test.ts",
                "test('adds', () => {\n  expect(1).toBe(1);\n});\n",
            ),
            (".github/workflows/ci.yml", CI),
        ])?;
        let (sink, summary) = run_pass(&TestingValidator, &ctx).await?;

        let coverage: Vec<_> = sink.in_category("coverage").collect();
        assert_eq!(coverage.len(), 1);
        assert_eq!(coverage[0].file, "src/order.ts");
        assert_eq!(sink.in_category("structure").count(), 0);
        assert_eq!(summary.metrics["test_ratio"], 0.5);

        // 40% * 50 + 30% * 100 + 30% * 100
        assert!((summary.score.unwrap() - 80.0).abs() < 1e-9);
        assert!(!summary.failed);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_ci_and_weak_tests() -> Result<()> {
        let (_dir, ctx) = project(&[
            ("src/cart.ts", "export const cart = 1;\n"),
            (
                "src/cart.spec.ts",
                "beforeEach(() => { reset(); });\nit('works', () => {\n  const password = 'hunter22';\n  run(password);\n});\n",
            ),
        ])?;
        let (sink, summary) = run_pass(&TestingValidator, &ctx).await?;

        let quality: Vec<_> = sink.in_category("quality").collect();
        // no assertions + hard-coded credential
        assert_eq!(quality.len(), 2);
        let structure: Vec<_> = sink.in_category("structure").collect();
        assert_eq!(structure.len(), 2);
        assert!(structure.iter().any(|f| f.severity == Severity::High));
        assert_eq!(summary.metrics["score.coverage"], 100.0);
        Ok(())
    }

    #[test]
    fn test_long_test_body() {
        let body: String = (0..60).map(|i| format!("  step{}();\n", i)).collect();
        let content = format!("it('long', () => {{\n{}  expect(x).ok;\n}});\n", body);
        let mut sink = FindingSink::new("testing");
        inspect_test_file(&SourceFile::virtual_file("src/a.test.ts", content), 50, &mut sink);
        assert_eq!(sink.len(), 1);
        assert!(sink.findings()[0].message.contains("63 lines"));
    }
}
