// warden-core/src/application/passes/env_consistency.rs

use crate::domain::finding::{FindingSink, Location, Severity};
use crate::domain::source::SourceFile;
use crate::domain::text::{is_comment_line, static_regex};
use crate::error::WardenError;
use crate::infrastructure::config::env_files::{ENV_FILES, declared_names};
use crate::ports::corpus::ScanFilter;
use crate::ports::validator::{PassSummary, ProjectContext, Validator};
use async_trait::async_trait;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

pub struct EnvConsistencyValidator;

fn re_env_use() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(
        &RE,
        r#"process\.env\.([A-Za-z_][A-Za-z0-9_]*)|process\.env\[\s*['"]([A-Za-z_][A-Za-z0-9_]*)['"]\s*\]|import\.meta\.env\.([A-Za-z_][A-Za-z0-9_]*)"#,
    )
}

/// Variable name -> first `(file, line)` using it.
pub fn used_names(files: &[SourceFile]) -> BTreeMap<String, (String, usize)> {
    let mut used = BTreeMap::new();
    for file in files {
        for (no, line) in file.numbered_lines() {
            if is_comment_line(line) {
                continue;
            }
            for caps in re_env_use().captures_iter(line) {
                if let Some(name) = (1..=3).find_map(|i| caps.get(i)) {
                    used.entry(name.as_str().to_string())
                        .or_insert_with(|| (file.rel_path.clone(), no));
                }
            }
        }
    }
    used
}

#[async_trait]
impl Validator for EnvConsistencyValidator {
    fn name(&self) -> &'static str {
        "env-consistency"
    }

    fn description(&self) -> &'static str {
        "Environment variables used in code versus declared in .env files"
    }

    async fn validate(
        &self,
        ctx: &ProjectContext,
        sink: &mut FindingSink,
    ) -> Result<PassSummary, WardenError> {
        let config = &ctx.config;

        // Declared name -> first file declaring it
        let mut declared: BTreeMap<String, &str> = BTreeMap::new();
        for env_file in ENV_FILES {
            if let Some(content) = ctx.corpus.read_optional(env_file).await? {
                for name in declared_names(&content) {
                    declared.entry(name).or_insert(env_file);
                }
            }
        }

        let files = ctx.corpus.scan(&ScanFilter::sources(config)).await?;
        let used = used_names(&files);
        let implicit: BTreeSet<&str> = config.implicit_env.iter().map(String::as_str).collect();

        for (name, (file, line)) in &used {
            if !declared.contains_key(name) && !implicit.contains(name.as_str()) {
                sink.emit(
                    Severity::Medium,
                    "undeclared",
                    Location::line(file.clone(), *line),
                    format!("'{}' is used but not declared in any .env file", name),
                );
            }
        }
        for (name, env_file) in &declared {
            if !used.contains_key(name) && !implicit.contains(name.as_str()) {
                sink.emit(
                    Severity::Low,
                    "unused",
                    Location::file(*env_file),
                    format!("'{}' is declared but never used", name),
                );
            }
        }

        Ok(PassSummary::empty()
            .with_metric("declared", declared.len() as f64)
            .with_metric("used", used.len() as f64))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::application::passes::testing_support::{project, run_pass};
    use anyhow::Result;

    #[test]
    fn test_all_access_forms() {
        let files = vec![SourceFile::virtual_file(
            "src/config/env.ts",
            "const a = process.env.DATABASE_URL;\nconst b = process.env['JWT_SECRET'];\nconst c = import.meta.env.VITE_API;\n// process.env.IGNORED\n",
        )];
        let used = used_names(&files);
        let names: Vec<_> = used.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["DATABASE_URL", "JWT_SECRET", "VITE_API"]);
        assert_eq!(used["JWT_SECRET"], ("src/config/env.ts".to_string(), 2));
    }

    #[tokio::test]
    async fn test_undeclared_and_unused() -> Result<()> {
        let (_dir, ctx) = project(&[
            (".env.example", "PORT=3000\nSTRIPE_KEY=\n"),
            (
                "src/server.ts",
                "const port = process.env.PORT;\nconst db = process.env.DATABASE_URL;\nif (process.env.NODE_ENV === 'production') {}\n",
            ),
        ])?;
        let (sink, _) = run_pass(&EnvConsistencyValidator, &ctx).await?;

        let undeclared: Vec<_> = sink.in_category("undeclared").collect();
        assert_eq!(undeclared.len(), 1);
        assert!(undeclared[0].message.contains("DATABASE_URL"));
        let unused: Vec<_> = sink.in_category("unused").collect();
        assert_eq!(unused.len(), 1);
        assert_eq!(unused[0].file, ".env.example");
        Ok(())
    }

    #[tokio::test]
    async fn test_no_env_files_declares_nothing() -> Result<()> {
        let (_dir, ctx) = project(&[("src/a.ts", "process.env.API_URL;\n")])?;
        let (sink, summary) = run_pass(&EnvConsistencyValidator, &ctx).await?;
        assert_eq!(sink.len(), 1);
        assert_eq!(summary.metrics["declared"], 0.0);
        Ok(())
    }
}
