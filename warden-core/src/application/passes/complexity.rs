// warden-core/src/application/passes/complexity.rs

use crate::domain::finding::{FindingSink, Location, Severity};
use crate::domain::source::SourceFile;
use crate::domain::text::{blank_strings, block_end, is_comment_line, static_regex, strip_line_comment};
use crate::error::WardenError;
use crate::ports::corpus::ScanFilter;
use crate::ports::validator::{PassSummary, ProjectContext, Validator};
use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;

pub struct ComplexityValidator;

/// A function body located by brace matching. Lines are 0-based indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSpan {
    pub name: String,
    pub start: usize,
    pub end: usize,
    pub complexity: u32,
}

fn re_function_start() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(
        &RE,
        r"(?x)
        ^\s*(?:export\s+)?(?:default\s+)?(?:async\s+)?function\s*\*?\s*(?P<decl>[A-Za-z_$][\w$]*)\s*[(<]
        | \b(?:const|let|var)\s+(?P<arrow>[A-Za-z_$][\w$]*)\s*(?::[^=]+)?=\s*(?:async\s+)?(?:\([^)]*\)|[A-Za-z_$][\w$]*)\s*(?::[^=]+)?=>
        | ^\s*(?:(?:public|private|protected|static|async|get|set)\s+)*(?P<method>[A-Za-z_$][\w$]*)\s*\([^)]*\)\s*(?::[^{]+)?\{",
    )
}

fn re_decision() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r"\b(if|for|while|case|catch)\b|&&|\|\||\?\?|\s\?\s")
}

const NOT_METHODS: [&str; 6] = ["if", "for", "while", "switch", "catch", "function"];

/// Every function-like block in `file` with its cyclomatic estimate.
pub fn functions(file: &SourceFile) -> Vec<FunctionSpan> {
    let lines: Vec<&str> = file.content.lines().collect();
    let mut spans = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        if is_comment_line(line) {
            continue;
        }
        let code = blank_strings(strip_line_comment(line));
        let Some(caps) = re_function_start().captures(&code) else {
            continue;
        };
        let name = ["decl", "arrow", "method"]
            .iter()
            .find_map(|g| caps.name(g))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        if NOT_METHODS.contains(&name.as_str()) {
            continue;
        }
        let Some(end) = block_end(&lines, idx) else {
            continue;
        };
        spans.push(FunctionSpan {
            name,
            start: idx,
            end,
            complexity: 1 + decisions(&lines[idx..=end]),
        });
    }
    spans
}

fn decisions(body: &[&str]) -> u32 {
    body.iter()
        .filter(|line| !is_comment_line(line))
        .map(|line| {
            let code = blank_strings(strip_line_comment(line));
            re_decision().find_iter(&code).count() as u32
        })
        .sum()
}

#[async_trait]
impl Validator for ComplexityValidator {
    fn name(&self) -> &'static str {
        "complexity"
    }

    fn description(&self) -> &'static str {
        "Cyclomatic complexity estimate per function"
    }

    async fn validate(
        &self,
        ctx: &ProjectContext,
        sink: &mut FindingSink,
    ) -> Result<PassSummary, WardenError> {
        let threshold = ctx.config.thresholds.complexity;
        let files = ctx.corpus.scan(&ScanFilter::sources(&ctx.config)).await?;

        let mut count = 0usize;
        let mut total = 0u64;
        let mut max = 0u32;
        for file in files.iter().filter(|f| !f.is_test() && !f.is_declaration()) {
            for span in functions(file) {
                count += 1;
                total += u64::from(span.complexity);
                max = max.max(span.complexity);

                let severity = if span.complexity > threshold.saturating_mul(2) {
                    Severity::High
                } else if span.complexity > threshold {
                    Severity::Medium
                } else {
                    continue;
                };
                sink.emit(
                    severity,
                    "function",
                    Location::line(file.rel_path.clone(), span.start + 1),
                    format!(
                        "Function '{}' has complexity {} (threshold {})",
                        span.name, span.complexity, threshold
                    ),
                );
            }
        }

        let mean = if count == 0 {
            0.0
        } else {
            total as f64 / count as f64
        };
        Ok(PassSummary::empty()
            .with_metric("functions", count as f64)
            .with_metric("max_complexity", f64::from(max))
            .with_metric("mean_complexity", mean))
    }
}
