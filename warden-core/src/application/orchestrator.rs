// warden-core/src/application/orchestrator.rs

use crate::application::passes::registry;
use crate::application::report::{render_markdown, write_report};
use crate::domain::error::DomainError;
use crate::domain::finding::{FindingSink, Location, Severity};
use crate::domain::ports::Clock;
use crate::domain::project::ProjectConfig;
use crate::domain::report::{PassOutcome, ValidationReport};
use crate::error::WardenError;
use crate::ports::validator::{PassSummary, ProjectContext, Validator};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Category of the single finding that replaces a crashed pass.
pub const PASS_FAILURE_CATEGORY: &str = "pass-failure";

/// Registered passes minus the disabled ones, in registry order.
///
/// Unknown names in `disabled` are rejected so a typo cannot silently turn a
/// pass off.
pub fn enabled_validators(config: &ProjectConfig) -> Result<Vec<Box<dyn Validator>>, WardenError> {
    let all = registry();
    for name in &config.disabled {
        if !all.iter().any(|v| v.name() == name) {
            return Err(DomainError::UnknownValidator(name.clone()).into());
        }
    }
    Ok(all
        .into_iter()
        .filter(|v| config.is_enabled(v.name()))
        .collect())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Runs one pass behind the isolation wrapper.
///
/// A returned error or a panic becomes exactly one critical finding appended
/// after whatever the pass had already emitted; the outcome is then failing.
pub async fn run_isolated(validator: &dyn Validator, ctx: &ProjectContext) -> PassOutcome {
    let name = validator.name();
    let mut sink = FindingSink::new(name);

    let result = AssertUnwindSafe(validator.validate(ctx, &mut sink))
        .catch_unwind()
        .await;

    let failure = match result {
        Ok(Ok(summary)) => Ok(summary),
        Ok(Err(e)) => Err(e.to_string()),
        Err(payload) => Err(format!("panicked: {}", panic_message(payload.as_ref()))),
    };
    let summary = match failure {
        Ok(summary) => summary,
        Err(message) => {
            warn!(validator = name, error = %message, "Validator failed, continuing");
            sink.emit(
                Severity::Critical,
                PASS_FAILURE_CATEGORY,
                Location::project(),
                format!("Validator '{}' failed: {}", name, message),
            );
            PassSummary::empty().failing()
        }
    };

    let findings = sink.into_findings();
    let fail_on = ctx.config.fail_on;
    let has_errors = summary.failed || findings.iter().any(|f| f.severity >= fail_on);
    let details = findings.iter().map(|f| f.render()).collect();

    PassOutcome {
        name: name.to_string(),
        description: validator.description().to_string(),
        has_errors,
        findings,
        details,
        metrics: summary.metrics,
        score: summary.score,
        grade: summary.grade,
    }
}

pub struct Orchestrator {
    validators: Vec<Box<dyn Validator>>,
    clock: Arc<dyn Clock>,
}

impl Orchestrator {
    pub fn new(validators: Vec<Box<dyn Validator>>, clock: Arc<dyn Clock>) -> Self {
        Self { validators, clock }
    }

    /// Every registered pass the configuration leaves enabled.
    pub fn from_config(config: &ProjectConfig, clock: Arc<dyn Clock>) -> Result<Self, WardenError> {
        Ok(Self::new(enabled_validators(config)?, clock))
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.validators.iter().map(|v| v.name()).collect()
    }

    /// Runs the passes one after another. Never fails: pass failures are
    /// folded into the report.
    #[instrument(skip_all, fields(root = %ctx.root.display(), passes = self.validators.len()))]
    pub async fn run(&self, ctx: &ProjectContext) -> ValidationReport {
        let timestamp = self.clock.now();
        let mut outcomes = Vec::with_capacity(self.validators.len());

        for validator in &self.validators {
            info!(validator = validator.name(), "Running validator");
            let outcome = run_isolated(validator.as_ref(), ctx).await;
            info!(
                validator = validator.name(),
                findings = outcome.findings.len(),
                failed = outcome.has_errors,
                "Validator finished"
            );
            outcomes.push(outcome);
        }

        ValidationReport {
            timestamp,
            outcomes,
        }
    }

    /// Runs the passes and overwrites the configured report file.
    pub async fn run_and_persist(
        &self,
        ctx: &ProjectContext,
    ) -> Result<(ValidationReport, PathBuf), WardenError> {
        let report = self.run(ctx).await;
        let path = ctx.root.join(&ctx.config.report_path);
        write_report(&path, &render_markdown(&report))?;
        info!(path = %path.display(), failed = report.validators_failed(), "Report written");
        Ok((report, path))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::application::passes::testing_support::{project, project_with};
    use crate::domain::ports::FixedClock;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};

    struct Emits(Severity);
    struct ErrorsAfterOne;
    struct Panics;

    #[async_trait]
    impl Validator for Emits {
        fn name(&self) -> &'static str {
            "emits"
        }
        fn description(&self) -> &'static str {
            "emits one finding"
        }
        async fn validate(
            &self,
            _ctx: &ProjectContext,
            sink: &mut FindingSink,
        ) -> Result<PassSummary, WardenError> {
            sink.emit(self.0, "test", Location::file("src/a.ts"), "one");
            Ok(PassSummary::empty().with_metric("count", 1.0))
        }
    }

    #[async_trait]
    impl Validator for ErrorsAfterOne {
        fn name(&self) -> &'static str {
            "errors"
        }
        fn description(&self) -> &'static str {
            "fails halfway"
        }
        async fn validate(
            &self,
            _ctx: &ProjectContext,
            sink: &mut FindingSink,
        ) -> Result<PassSummary, WardenError> {
            sink.emit(Severity::Low, "test", Location::file("src/a.ts"), "before");
            Err(WardenError::InternalError("manifest unreadable".to_string()))
        }
    }

    #[async_trait]
    impl Validator for Panics {
        fn name(&self) -> &'static str {
            "panics"
        }
        fn description(&self) -> &'static str {
            "crashes"
        }
        async fn validate(
            &self,
            _ctx: &ProjectContext,
            _sink: &mut FindingSink,
        ) -> Result<PassSummary, WardenError> {
            panic!("index out of bounds");
        }
    }

    fn clock() -> Arc<dyn Clock> {
        Arc::new(FixedClock(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()))
    }

    #[tokio::test]
    async fn test_failures_are_isolated_and_later_passes_still_run() -> anyhow::Result<()> {
        let (_dir, ctx) = project(&[("src/a.ts", "export const a = 1;\n")])?;
        let orchestrator = Orchestrator::new(
            vec![
                Box::new(ErrorsAfterOne),
                Box::new(Panics),
                Box::new(Emits(Severity::Low)),
            ],
            clock(),
        );

        let report = orchestrator.run(&ctx).await;

        assert_eq!(report.validators_run(), 3);
        let errors = report.outcome("errors").unwrap();
        assert!(errors.has_errors);
        assert_eq!(errors.findings.len(), 2);
        assert_eq!(errors.findings[0].message, "before");
        assert_eq!(errors.findings[1].severity, Severity::Critical);
        assert!(errors.findings[1].message.contains("manifest unreadable"));

        let panics = report.outcome("panics").unwrap();
        assert_eq!(panics.findings.len(), 1);
        assert!(panics.findings[0].message.contains("index out of bounds"));

        let emits = report.outcome("emits").unwrap();
        assert!(!emits.has_errors);
        assert_eq!(emits.metrics["count"], 1.0);
        assert_eq!(report.validators_failed(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_fail_on_threshold() -> anyhow::Result<()> {
        let config = ProjectConfig {
            fail_on: Severity::High,
            ..ProjectConfig::default()
        };
        let (_dir, ctx) = project_with(&[], config)?;

        let medium = run_isolated(&Emits(Severity::Medium), &ctx).await;
        let high = run_isolated(&Emits(Severity::High), &ctx).await;

        assert!(!medium.has_errors);
        assert!(high.has_errors);
        assert_eq!(high.details, vec!["[HIGH] test: one (src/a.ts)"]);
        Ok(())
    }

    #[test]
    fn test_unknown_disabled_name_is_rejected() {
        let config = ProjectConfig {
            disabled: vec!["orphans".to_string(), "spellcheck".to_string()],
            ..ProjectConfig::default()
        };
        assert!(matches!(
            enabled_validators(&config),
            Err(WardenError::Domain(DomainError::UnknownValidator(name))) if name == "spellcheck"
        ));
    }

    #[test]
    fn test_disabled_passes_are_skipped() {
        let config = ProjectConfig {
            disabled: vec!["orphans".to_string(), "autofix".to_string()],
            ..ProjectConfig::default()
        };
        let orchestrator = Orchestrator::from_config(&config, clock()).unwrap();
        let names = orchestrator.names();
        assert_eq!(names.len(), 14);
        assert!(!names.contains(&"orphans"));
        assert_eq!(names[0], "architecture");
    }

    #[tokio::test]
    async fn test_report_is_persisted_and_overwritten() -> anyhow::Result<()> {
        let (dir, ctx) = project(&[("VALIDATION_REPORT.md", "stale content\n")])?;
        let orchestrator = Orchestrator::new(vec![Box::new(Emits(Severity::Low))], clock());

        let (report, path) = orchestrator.run_and_persist(&ctx).await?;

        assert!(report.is_clean());
        assert_eq!(path, dir.path().join("VALIDATION_REPORT.md"));
        let written = std::fs::read_to_string(path)?;
        assert!(!written.contains("stale content"));
        assert!(written.starts_with("# Validation Report"));
        Ok(())
    }
}
