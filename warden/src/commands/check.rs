// warden/src/commands/check.rs
//
// USE CASE: Run every enabled validator, write the report, summarise it.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use comfy_table::Table;
use comfy_table::presets::UTF8_FULL;
use warden_core::application::Orchestrator;
use warden_core::domain::report::ValidationReport;
use warden_core::infrastructure::SystemClock;

use super::project_context;
use crate::cli::OutputFormat;

pub async fn execute(
    project_dir: PathBuf,
    config: Option<PathBuf>,
    format: OutputFormat,
    strict: bool,
) -> anyhow::Result<()> {
    let start = Instant::now();
    let human = format == OutputFormat::Markdown;

    if human {
        println!("⚙️  Loading configuration...");
    }
    let ctx = project_context(&project_dir, config.as_deref())?;
    let orchestrator = Orchestrator::from_config(&ctx.config, Arc::new(SystemClock::from_env()))?;

    if human {
        println!(
            "🛡️  Running {} validators on {}",
            orchestrator.names().len(),
            project_dir.display()
        );
    }
    let (report, report_path) = orchestrator.run_and_persist(&ctx).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Markdown => {
            println!("{}", summary_table(&report));
            println!("📄 Report written to {}", report_path.display());
        }
    }

    if report.is_clean() {
        if human {
            println!("\n✨ All clear! Checked in {:.2?}", start.elapsed());
        }
        return Ok(());
    }

    eprintln!(
        "\n❌ {} of {} validators failed.",
        report.validators_failed(),
        report.validators_run()
    );
    if strict {
        eprintln!("💥 --strict mode: Failing due to validator errors.");
        std::process::exit(1);
    }
    Ok(())
}

fn summary_table(report: &ValidationReport) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Validator", "Status", "Findings", "Score"]);
    for outcome in &report.outcomes {
        let status = if outcome.has_errors { "❌ failed" } else { "✅ passed" };
        let score = match (outcome.score, outcome.grade) {
            (Some(score), Some(grade)) => format!("{:.1} ({})", score, grade),
            _ => "-".to_string(),
        };
        table.add_row(vec![
            outcome.name.clone(),
            status.to_string(),
            outcome.findings.len().to_string(),
            score,
        ]);
    }
    table
}
