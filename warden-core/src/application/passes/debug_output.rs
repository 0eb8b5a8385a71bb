// warden-core/src/application/passes/debug_output.rs

use crate::domain::finding::{FindingSink, Severity};
use crate::domain::project::ProjectConfig;
use crate::domain::rules::{PatternRule, Rule, apply_rules};
use crate::domain::source::SourceFile;
use crate::domain::text::static_regex;
use crate::error::WardenError;
use crate::ports::corpus::ScanFilter;
use crate::ports::validator::{PassSummary, ProjectContext, Validator};
use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;

pub struct DebugOutputValidator;

fn re_console() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r"\bconsole\.(log|debug|trace|dir|table)\s*\(")
}

fn re_debugger() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r"^\s*debugger\s*;?\s*$")
}

pub fn rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(PatternRule {
            id: "console",
            description: "Stray console output",
            category: "console",
            severity: Severity::Low,
            pattern: re_console(),
        }),
        Box::new(PatternRule {
            id: "debugger",
            description: "Debugger statement",
            category: "debugger",
            severity: Severity::Medium,
            pattern: re_debugger(),
        }),
    ]
}

/// The logger implementation itself is allowed to write to the console.
pub fn is_logger_module(config: &ProjectConfig, file: &SourceFile) -> bool {
    let without_ext = file
        .rel_path
        .strip_suffix(&format!(".{}", file.extension))
        .unwrap_or(&file.rel_path);
    without_ext == config.logger_module || file.stem().eq_ignore_ascii_case("logger")
}

#[async_trait]
impl Validator for DebugOutputValidator {
    fn name(&self) -> &'static str {
        "debug-output"
    }

    fn description(&self) -> &'static str {
        "Leftover console output and debugger statements"
    }

    async fn validate(
        &self,
        ctx: &ProjectContext,
        sink: &mut FindingSink,
    ) -> Result<PassSummary, WardenError> {
        let files = ctx.corpus.scan(&ScanFilter::sources(&ctx.config)).await?;
        let rules = rules();
        let mut hits = 0;
        for file in files
            .iter()
            .filter(|f| !f.is_test() && !is_logger_module(&ctx.config, f))
        {
            hits += apply_rules(&rules, file, sink);
        }
        Ok(PassSummary::empty().with_metric("statements", hits as f64))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::application::passes::testing_support::{project, run_pass};
    use anyhow::Result;

    #[tokio::test]
    async fn test_console_and_debugger() -> Result<()> {
        let (_dir, ctx) = project(&[
            (
                "src/services/cart.ts",
                "console.log('x');\nconsole.error('kept');\n  debugger;\n// console.log('commented')\n",
            ),
            ("src/utils/logger.ts", "console.log('allowed');\n"),
            ("src/cart.test.ts", "console.log('fine in tests');\n"),
        ])?;
        let (sink, summary) = run_pass(&DebugOutputValidator, &ctx).await?;

        let found: Vec<_> = sink
            .findings()
            .iter()
            .map(|f| (f.severity, f.line))
            .collect();
        assert_eq!(
            found,
            vec![(Severity::Low, Some(1)), (Severity::Medium, Some(3))]
        );
        assert_eq!(summary.metrics["statements"], 2.0);
        Ok(())
    }
}
