// warden-core/src/application/remediation.rs

// Apply phase of auto-remediation. The analyze phase (the `autofix` pass)
// computes a plan without touching the tree; this module is the only code in
// the crate that rewrites project files.

use crate::domain::error::DomainError;
use crate::error::WardenError;
use crate::infrastructure::fs::atomic_write;
use std::fs;
use std::path::{Component, Path};
use tracing::{info, instrument};

/// One pending file change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEdit {
    pub rel_path: String,
    /// Content the edit was computed from. `None` when the edit creates the file.
    pub original: Option<String>,
    pub updated: String,
    /// Ids of the rules that changed the file, in application order.
    pub rules: Vec<&'static str>,
}

impl FileEdit {
    pub fn creates_file(&self) -> bool {
        self.original.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixPlan {
    pub edits: Vec<FileEdit>,
}

impl FixPlan {
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    /// Total number of rule applications across all files.
    pub fn rule_hits(&self) -> usize {
        self.edits.iter().map(|e| e.rules.len()).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub dry_run: bool,
    /// Files written, or that would be written in dry-run mode.
    pub files: Vec<String>,
}

fn check_relative(rel_path: &str) -> Result<(), WardenError> {
    let escapes = Path::new(rel_path).components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if escapes {
        return Err(WardenError::UnsafePath(rel_path.to_string()));
    }
    Ok(())
}

/// Refuses the whole plan when any target changed since it was analysed.
fn check_fresh(root: &Path, edit: &FileEdit) -> Result<(), WardenError> {
    let path = root.join(&edit.rel_path);
    let current = match fs::read(&path) {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => return Err(e.into()),
    };
    if current != edit.original {
        return Err(DomainError::StalePlan(edit.rel_path.clone()).into());
    }
    Ok(())
}

/// Writes every edit of `plan` under `root`, each through a temp file and a rename.
///
/// All targets are checked before the first write, so a stale plan leaves the
/// tree untouched. With `dry_run` nothing is written and the report lists the
/// files that would change.
#[instrument(skip(plan), fields(edits = plan.len()))]
pub fn apply_plan(root: &Path, plan: &FixPlan, dry_run: bool) -> Result<ApplyReport, WardenError> {
    for edit in &plan.edits {
        check_relative(&edit.rel_path)?;
        check_fresh(root, edit)?;
    }

    let files: Vec<String> = plan.edits.iter().map(|e| e.rel_path.clone()).collect();
    if dry_run {
        info!(files = files.len(), "Dry run, nothing written");
        return Ok(ApplyReport {
            dry_run: true,
            files,
        });
    }

    for edit in &plan.edits {
        let path = root.join(&edit.rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        atomic_write(&path, &edit.updated)?;
        info!(file = %edit.rel_path, rules = ?edit.rules, "Applied fixes");
    }

    Ok(ApplyReport {
        dry_run: false,
        files,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::application::passes::autofix::build_plan;
    use crate::application::passes::testing_support::project;
    use anyhow::Result;

    const MESSY: &str = "import { b } from './b';\nimport express from 'express';\n\nconst retryCount = 3;\n\nexport function handle(req: any,res: any) {\n  console.log('handling',req);\n  return retryCount;\n}\n";

    #[tokio::test]
    async fn test_apply_then_analyse_again_is_a_no_op() -> Result<()> {
        let (dir, ctx) = project(&[
            ("src/services/handler.ts", MESSY),
            ("src/services/b.ts", "export const b = 1;\n"),
            ("src/utils/logger.ts", "export const logger = console;\n"),
        ])?;

        let plan = build_plan(&ctx).await?;
        assert!(!plan.is_empty());
        let report = apply_plan(dir.path(), &plan, false)?;
        assert!(!report.dry_run);

        let rewritten = fs::read_to_string(dir.path().join("src/services/handler.ts"))?;
        assert!(rewritten.contains("const RETRY_COUNT = 3;"));
        assert!(rewritten.contains("export function handle(req: unknown, res: unknown) {"));
        assert!(rewritten.contains("logger.info('handling', req);"));
        assert!(rewritten.contains("export default handle;"));
        assert!(dir.path().join(".prettierrc").exists());

        let again = build_plan(&ctx).await?;
        assert!(again.is_empty(), "{:#?}", again.edits);
        Ok(())
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() -> Result<()> {
        let (dir, ctx) = project(&[("src/services/handler.ts", MESSY)])?;
        let plan = build_plan(&ctx).await?;

        let report = apply_plan(dir.path(), &plan, true)?;

        assert!(report.dry_run);
        assert_eq!(report.files.len(), plan.len());
        assert_eq!(
            fs::read_to_string(dir.path().join("src/services/handler.ts"))?,
            MESSY
        );
        assert!(!dir.path().join(".prettierrc").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_stale_plan_is_refused() -> Result<()> {
        let (dir, ctx) = project(&[("src/services/handler.ts", MESSY)])?;
        let plan = build_plan(&ctx).await?;
        fs::write(dir.path().join("src/services/handler.ts"), "// edited meanwhile\n")?;

        let result = apply_plan(dir.path(), &plan, false);

        assert!(matches!(
            result,
            Err(WardenError::Domain(DomainError::StalePlan(_)))
        ));
        assert!(!dir.path().join(".prettierrc").exists());
        Ok(())
    }

    #[test]
    fn test_paths_outside_the_project_are_rejected() {
        let plan = FixPlan {
            edits: vec![FileEdit {
                rel_path: "../outside.ts".to_string(),
                original: None,
                updated: String::new(),
                rules: vec!["tool-config"],
            }],
        };
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            apply_plan(dir.path(), &plan, true),
            Err(WardenError::UnsafePath(_))
        ));
    }
}
