// warden/src/commands/fix.rs
//
// USE CASE: Compute the automatic fixes and apply them (or preview with --dry-run).

use std::path::PathBuf;

use warden_core::application::{apply_plan, build_plan};

use super::project_context;

pub async fn execute(project_dir: PathBuf, dry_run: bool) -> anyhow::Result<()> {
    println!("🔎 Analyzing {} for fixable issues...", project_dir.display());

    let ctx = project_context(&project_dir, None)?;
    let plan = build_plan(&ctx).await?;

    if plan.is_empty() {
        println!("✨ Nothing to fix.");
        return Ok(());
    }

    println!(
        "📝 {} fixes pending across {} files:",
        plan.rule_hits(),
        plan.len()
    );
    for edit in &plan.edits {
        let marker = if edit.creates_file() { "+" } else { "~" };
        println!("   {} {} [{}]", marker, edit.rel_path, edit.rules.join(", "));
    }

    let applied = apply_plan(&project_dir, &plan, dry_run)?;

    if applied.dry_run {
        println!("\n🧪 Dry run: {} files left untouched.", applied.files.len());
    } else {
        println!("\n✨ {} files rewritten.", applied.files.len());
    }
    Ok(())
}
