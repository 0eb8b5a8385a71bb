// warden-core/src/application/passes/type_safety.rs

use crate::domain::finding::{FindingSink, Severity};
use crate::domain::rules::{PatternRule, Rule, RuleHit, apply_rules};
use crate::domain::source::SourceFile;
use crate::domain::text::static_regex;
use crate::error::WardenError;
use crate::ports::corpus::ScanFilter;
use crate::ports::validator::{PassSummary, ProjectContext, Validator};
use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;

pub struct TypeSafetyValidator;

fn re_loose_any() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r":\s*any\b|\bas\s+any\b|<any>|\bany\[\]")
}

fn re_ts_ignore() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r"@ts-ignore\b")
}

fn re_ts_nocheck() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r"@ts-nocheck\b")
}

// Compiler directives live in comments, so these rules cannot reuse the
// comment-skipping `PatternRule`.
fn directive_hits(
    file: &SourceFile,
    pattern: &Regex,
    severity: Severity,
    message: &str,
) -> Vec<RuleHit> {
    file.numbered_lines()
        .filter(|(_, line)| pattern.is_match(line))
        .map(|(no, _)| RuleHit::at(severity, "directive", no, message))
        .collect()
}

struct DirectiveRule {
    id: &'static str,
    description: &'static str,
    severity: Severity,
    pattern: fn() -> &'static Regex,
}

impl Rule for DirectiveRule {
    fn id(&self) -> &'static str {
        self.id
    }

    fn description(&self) -> &'static str {
        self.description
    }

    fn check(&self, file: &SourceFile) -> Vec<RuleHit> {
        directive_hits(file, (self.pattern)(), self.severity, self.description)
    }
}

pub fn rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(PatternRule {
            id: "loose-any",
            description: "Loose `any` type",
            category: "any",
            severity: Severity::Medium,
            pattern: re_loose_any(),
        }),
        Box::new(DirectiveRule {
            id: "ts-ignore",
            description: "`@ts-ignore` suppresses a type error",
            severity: Severity::Medium,
            pattern: re_ts_ignore,
        }),
        Box::new(DirectiveRule {
            id: "ts-nocheck",
            description: "`@ts-nocheck` disables type checking for the whole file",
            severity: Severity::High,
            pattern: re_ts_nocheck,
        }),
    ]
}

#[async_trait]
impl Validator for TypeSafetyValidator {
    fn name(&self) -> &'static str {
        "type-safety"
    }

    fn description(&self) -> &'static str {
        "Loose `any` usage and disabled type checking in TypeScript sources"
    }

    async fn validate(
        &self,
        ctx: &ProjectContext,
        sink: &mut FindingSink,
    ) -> Result<PassSummary, WardenError> {
        let files = ctx
            .corpus
            .scan(&ScanFilter::sources_with(&ctx.config, &["ts", "tsx"]))
            .await?;
        let rules = rules();

        let mut loose = 0;
        for file in files.iter().filter(|f| !f.is_declaration()) {
            loose += apply_rules(&rules, file, sink);
        }

        Ok(PassSummary::empty()
            .with_metric("files", files.len() as f64)
            .with_metric("loose_usages", loose as f64))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::application::passes::testing_support::{project, run_pass};
    use anyhow::Result;

    #[test]
    fn test_loose_any_forms() {
        let file = SourceFile::virtual_file(
            "src/a.ts",
            "let a: any = 1;\nconst b = x as any;\nconst c = <any>y;\nlet d: any[] = [];\nconst company = 1;\n// a: any in a comment\n",
        );
        let hits = rules()[0].check(&file);
        let lines: Vec<_> = hits.iter().filter_map(|h| h.line).collect();
        assert_eq!(lines, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_directives_and_metric() -> Result<()> {
        let (_dir, ctx) = project(&[
            (
                "src/legacy.ts",
                "// @ts-nocheck\n// @ts-ignore\nexport const v: any = 1;\n",
            ),
            ("src/types.d.ts", "declare const x: any;\n"),
            ("src/plain.js", "const y: any = 1;\n"),
        ])?;
        let (sink, summary) = run_pass(&TypeSafetyValidator, &ctx).await?;

        assert_eq!(sink.len(), 3);
        assert!(
            sink.findings()
                .iter()
                .any(|f| f.severity == Severity::High && f.line == Some(1))
        );
        assert_eq!(summary.metrics["loose_usages"], 3.0);
        Ok(())
    }
}
