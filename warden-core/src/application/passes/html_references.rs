// warden-core/src/application/passes/html_references.rs

use crate::domain::finding::{FindingSink, Location, Severity};
use crate::domain::graph::join_normalized;
use crate::domain::source::SourceFile;
use crate::domain::text::{line_of, static_regex};
use crate::error::WardenError;
use crate::ports::corpus::ScanFilter;
use crate::ports::validator::{PassSummary, ProjectContext, Validator};
use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;

pub struct HtmlReferencesValidator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Script,
    Stylesheet,
    Other,
}

/// A local `src`/`href` reference in an HTML page, resolved to a project path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlRef {
    pub line: usize,
    pub kind: RefKind,
    pub target: String,
    pub resolved: String,
}

fn re_reference() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(
        &RE,
        r#"(?i)<(\w+)\b[^>]*?\b(?:src|href)\s*=\s*["']([^"']+)["'][^>]*>"#,
    )
}

fn is_external(target: &str) -> bool {
    let lower = target.to_lowercase();
    ["http:", "https:", "//", "data:", "mailto:", "tel:", "#", "javascript:"]
        .iter()
        .any(|p| lower.starts_with(p))
        || target.contains("{{")
        || target.contains("${")
}

/// Resolves a local reference. Root-relative targets (`/x`) resolve against the
/// page's top-level directory, everything else against the page's directory.
pub fn resolve_reference(page_rel: &str, target: &str) -> Option<String> {
    let target = target.split(['?', '#']).next().unwrap_or(target);
    if target.is_empty() {
        return None;
    }
    let base = match target.strip_prefix('/') {
        Some(_) => match page_rel.split_once('/') {
            Some((top, _)) => top,
            None => "",
        },
        None => match page_rel.rfind('/') {
            Some(idx) => &page_rel[..idx],
            None => "",
        },
    };
    let resolved = join_normalized(base, target.trim_start_matches('/'))?;
    (!resolved.is_empty()).then_some(resolved)
}

pub fn references(page: &SourceFile) -> Vec<HtmlRef> {
    re_reference()
        .captures_iter(&page.content)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let tag = caps[1].to_lowercase();
            let target = caps[2].trim().to_string();
            if is_external(&target) {
                return None;
            }
            let tag_text = whole.as_str().to_lowercase();
            let kind = if tag == "script" {
                RefKind::Script
            } else if tag == "link"
                && (tag_text.contains("stylesheet") || target.to_lowercase().ends_with(".css"))
            {
                RefKind::Stylesheet
            } else {
                RefKind::Other
            };
            let resolved = resolve_reference(&page.rel_path, &target)?;
            Some(HtmlRef {
                line: line_of(&page.content, whole.start()),
                kind,
                target,
                resolved,
            })
        })
        .collect()
}

#[async_trait]
impl Validator for HtmlReferencesValidator {
    fn name(&self) -> &'static str {
        "html-references"
    }

    fn description(&self) -> &'static str {
        "Local script, stylesheet and asset references in HTML pages"
    }

    async fn validate(
        &self,
        ctx: &ProjectContext,
        sink: &mut FindingSink,
    ) -> Result<PassSummary, WardenError> {
        let pages = ctx
            .corpus
            .scan(&ScanFilter::everywhere(&["html", "htm"]))
            .await?;

        let mut checked = 0;
        for page in &pages {
            for reference in references(page) {
                checked += 1;
                if ctx.corpus.exists(&reference.resolved) {
                    continue;
                }
                let severity = match reference.kind {
                    RefKind::Script | RefKind::Stylesheet => Severity::High,
                    RefKind::Other => Severity::Medium,
                };
                sink.emit(
                    severity,
                    "broken-reference",
                    Location::line(page.rel_path.clone(), reference.line),
                    format!(
                        "'{}' does not exist (resolved to {})",
                        reference.target, reference.resolved
                    ),
                );
            }
        }

        Ok(PassSummary::empty()
            .with_metric("pages", pages.len() as f64)
            .with_metric("references", checked as f64))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::application::passes::testing_support::{project, run_pass};
    use anyhow::Result;

    #[test]
    fn test_resolution() {
        assert_eq!(
            resolve_reference("public/shop/index.html", "/css/site.css"),
            Some("public/css/site.css".to_string())
        );
        assert_eq!(
            resolve_reference("public/shop/index.html", "../js/app.js?v=2"),
            Some("public/js/app.js".to_string())
        );
        assert_eq!(
            resolve_reference("index.html", "/app.js"),
            Some("app.js".to_string())
        );
        assert_eq!(resolve_reference("index.html", "../../x.js"), None);
    }

    #[tokio::test]
    async fn test_missing_references() -> Result<()> {
        let (_dir, ctx) = project(&[
            (
                "public/index.html",
                "<link rel=\"stylesheet\" href=\"/css/site.css\">\n<script src=\"js/app.js\"></script>\n<script src=\"https://cdn.example.com/x.js\"></script>\n<img src=\"img/logo.png\">\n<a href=\"#top\">top</a>\n",
            ),
            ("public/css/site.css", "body {}\n"),
        ])?;
        let (sink, summary) = run_pass(&HtmlReferencesValidator, &ctx).await?;

        let found: Vec<_> = sink
            .findings()
            .iter()
            .map(|f| (f.severity, f.line))
            .collect();
        assert_eq!(
            found,
            vec![(Severity::High, Some(2)), (Severity::Medium, Some(4))]
        );
        assert_eq!(summary.metrics["references"], 3.0);
        Ok(())
    }
}
