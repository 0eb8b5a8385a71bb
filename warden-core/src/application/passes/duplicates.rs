// warden-core/src/application/passes/duplicates.rs

use crate::domain::finding::{FindingSink, Location, Severity};
use crate::domain::source::SourceFile;
use crate::domain::text::{is_comment_line, static_regex};
use crate::error::WardenError;
use crate::ports::corpus::ScanFilter;
use crate::ports::validator::{PassSummary, ProjectContext, Validator};
use async_trait::async_trait;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

pub struct DuplicatesValidator;

fn re_symbol() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(
        &RE,
        r"^\s*(?:export\s+)?(?:default\s+)?(?:abstract\s+)?(?:class|interface)\s+([A-Za-z_$][\w$]*)|^\s*export\s+(?:default\s+)?(?:async\s+)?function\s*\*?\s*([A-Za-z_$][\w$]*)|^\s*export\s+const\s+([A-Za-z_$][\w$]*)\s*=\s*(?:async\s+)?(?:function\b|\([^)]*\)\s*=>)",
    )
}

/// Declared class, interface and exported function names in one file.
pub fn declared_symbols(file: &SourceFile) -> BTreeSet<String> {
    file.numbered_lines()
        .filter(|(_, line)| !is_comment_line(line))
        .filter_map(|(_, line)| {
            let caps = re_symbol().captures(line)?;
            (1..=3)
                .find_map(|i| caps.get(i))
                .map(|m| m.as_str().to_string())
        })
        .collect()
}

#[async_trait]
impl Validator for DuplicatesValidator {
    fn name(&self) -> &'static str {
        "duplicates"
    }

    fn description(&self) -> &'static str {
        "Classes, interfaces and exported functions declared in more than one file"
    }

    async fn validate(
        &self,
        ctx: &ProjectContext,
        sink: &mut FindingSink,
    ) -> Result<PassSummary, WardenError> {
        let files = ctx.corpus.scan(&ScanFilter::sources(&ctx.config)).await?;

        let mut owners: BTreeMap<String, Vec<&str>> = BTreeMap::new();
        for file in files.iter().filter(|f| !f.is_test() && !f.is_declaration()) {
            for symbol in declared_symbols(file) {
                owners.entry(symbol).or_default().push(&file.rel_path);
            }
        }

        let mut duplicated = 0;
        for (symbol, paths) in owners.iter().filter(|(_, p)| p.len() > 1) {
            duplicated += 1;
            sink.emit(
                Severity::Medium,
                "duplicate-symbol",
                Location::file(paths[0]),
                format!("'{}' is declared in {} files: {}", symbol, paths.len(), paths.join(", ")),
            );
        }

        Ok(PassSummary::empty()
            .with_metric("symbols", owners.len() as f64)
            .with_metric("duplicated", duplicated as f64))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::application::passes::testing_support::{project, run_pass};
    use anyhow::Result;

    #[tokio::test]
    async fn test_same_class_in_two_files_is_one_finding() -> Result<()> {
        let (_dir, ctx) = project(&[
            ("src/services/cart.ts", "export class CartService {}\n"),
            ("src/legacy-cart.ts", "class CartService {\n  constructor() {}\n}\n"),
            ("src/other.ts", "export class OrderService {}\n"),
        ])?;
        let (sink, summary) = run_pass(&DuplicatesValidator, &ctx).await?;

        assert_eq!(sink.len(), 1);
        let finding = &sink.findings()[0];
        assert_eq!(finding.severity, Severity::Medium);
        assert!(finding.message.contains("src/legacy-cart.ts"));
        assert!(finding.message.contains("src/services/cart.ts"));
        assert_eq!(summary.metrics["duplicated"], 1.0);
        Ok(())
    }

    #[test]
    fn test_symbols() {
        let file = SourceFile::virtual_file(
            "src/a.ts",
            "export interface Cart {}\nexport async function load() {}\nfunction local() {}\nexport const save = async (x) => x;\nexport const LIMIT = 3;\n",
        );
        let symbols: Vec<_> = declared_symbols(&file).into_iter().collect();
        assert_eq!(symbols, vec!["Cart", "load", "save"]);
    }
}
