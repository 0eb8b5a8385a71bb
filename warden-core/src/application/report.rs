// warden-core/src/application/report.rs

use crate::domain::report::ValidationReport;
use crate::error::WardenError;
use crate::infrastructure::fs::atomic_write;
use chrono::SecondsFormat;
use std::fmt::Write;
use std::fs;
use std::path::Path;

/// Renders the whole report. Pure: the same report always yields the same text.
pub fn render_markdown(report: &ValidationReport) -> String {
    let mut md = String::new();

    let _ = writeln!(md, "# Validation Report");
    let _ = writeln!(md);
    let _ = writeln!(
        md,
        "Generated: {}",
        report.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
    );
    let _ = writeln!(md);

    let _ = writeln!(md, "## Executive Summary");
    let _ = writeln!(md);
    let _ = writeln!(md, "| Metric | Value |");
    let _ = writeln!(md, "|---|---|");
    let _ = writeln!(md, "| Validators run | {} |", report.validators_run());
    let _ = writeln!(md, "| Validators passed | {} |", report.validators_passed());
    let _ = writeln!(md, "| Validators failed | {} |", report.validators_failed());
    let _ = writeln!(md, "| Total findings | {} |", report.total_findings());
    let _ = writeln!(md);

    let _ = writeln!(md, "| Validator | Status | Findings |");
    let _ = writeln!(md, "|---|---|---|");
    for outcome in &report.outcomes {
        let status = if outcome.has_errors { "❌ failed" } else { "✅ passed" };
        let _ = writeln!(
            md,
            "| {} | {} | {} |",
            outcome.name,
            status,
            outcome.findings.len()
        );
    }
    let _ = writeln!(md);

    let scored: Vec<_> = report
        .outcomes
        .iter()
        .filter_map(|o| Some((o, o.score?, o.grade?)))
        .collect();
    if !scored.is_empty() {
        let _ = writeln!(md, "## Scores");
        let _ = writeln!(md);
        let _ = writeln!(md, "| Validator | Score | Grade |");
        let _ = writeln!(md, "|---|---|---|");
        for (outcome, score, grade) in scored {
            let _ = writeln!(md, "| {} | {:.1} | {} |", outcome.name, score, grade);
        }
        let _ = writeln!(md);
    }

    if report.is_clean() {
        let _ = writeln!(md, "✅ All clear: every validator passed.");
        return md;
    }

    let _ = writeln!(md, "## Failing Validators");
    for outcome in report.failing() {
        let _ = writeln!(md);
        let _ = writeln!(md, "### ❌ {}", outcome.name);
        let _ = writeln!(md);
        let _ = writeln!(md, "_{}_", outcome.description);
        let _ = writeln!(md);
        for detail in &outcome.details {
            let _ = writeln!(md, "- {}", detail);
        }
    }
    md
}

/// Overwrites `path` with `content`, creating the parent directory if needed.
pub fn write_report(path: &Path, content: &str) -> Result<(), WardenError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    atomic_write(path, content)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::finding::{Finding, Severity};
    use crate::domain::report::PassOutcome;
    use crate::domain::scoring::Grade;
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeMap;

    fn outcome(name: &str, findings: Vec<Finding>, has_errors: bool) -> PassOutcome {
        PassOutcome {
            name: name.to_string(),
            description: format!("{} checks", name),
            has_errors,
            details: findings.iter().map(|f| f.render()).collect(),
            findings,
            metrics: BTreeMap::new(),
            score: None,
            grade: None,
        }
    }

    fn finding(validator: &str, severity: Severity, category: &str, file: &str, line: Option<usize>, message: &str) -> Finding {
        Finding {
            validator: validator.to_string(),
            severity,
            category: category.to_string(),
            message: message.to_string(),
            file: file.to_string(),
            line,
        }
    }

    fn sample_report() -> ValidationReport {
        let mut security = outcome(
            "security",
            vec![finding(
                "security",
                Severity::High,
                "A10",
                "src/services/image.ts",
                Some(12),
                "Outbound request built from request input",
            )],
            true,
        );
        security.score = Some(93.0);
        security.grade = Some(Grade::from_score(93.0));

        ValidationReport {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            outcomes: vec![
                outcome("naming", vec![], false),
                security,
                outcome(
                    "architecture",
                    vec![finding(
                        "architecture",
                        Severity::High,
                        "circular-dependency",
                        "src/a.ts",
                        None,
                        "src/a.ts and src/b.ts import each other",
                    )],
                    true,
                ),
            ],
        }
    }

    #[test]
    fn test_rendered_report() {
        let markdown = render_markdown(&sample_report());
        insta::assert_snapshot!("rendered_report", markdown);
    }

    #[test]
    fn test_all_clear_has_no_detail_sections() {
        let report = ValidationReport {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            outcomes: vec![outcome("naming", vec![], false), outcome("orphans", vec![], false)],
        };
        let markdown = render_markdown(&report);

        assert!(markdown.contains("All clear"));
        assert!(!markdown.contains("## Failing Validators"));
        assert!(!markdown.contains("## Scores"));
        assert!(markdown.contains("| Validators failed | 0 |"));
    }

    #[test]
    fn test_rendering_is_deterministic() {
        assert_eq!(render_markdown(&sample_report()), render_markdown(&sample_report()));
    }

    #[test]
    fn test_write_report_overwrites() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("reports/VALIDATION_REPORT.md");

        write_report(&path, "first run, much longer content\n")?;
        write_report(&path, "second\n")?;

        assert_eq!(fs::read_to_string(path)?, "second\n");
        Ok(())
    }
}
