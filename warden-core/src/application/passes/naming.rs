// warden-core/src/application/passes/naming.rs

use crate::domain::finding::{FindingSink, Severity};
use crate::domain::rules::{FnRule, Rule, RuleHit, apply_rules};
use crate::domain::source::SourceFile;
use crate::domain::text::{
    is_camel_case, is_comment_line, is_kebab_case, is_pascal_case, is_upper_snake, static_regex,
};
use crate::error::WardenError;
use crate::ports::corpus::ScanFilter;
use crate::ports::validator::{PassSummary, ProjectContext, Validator};
use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;

pub struct NamingValidator;

fn re_type_decl() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(
        &RE,
        r"^\s*(?:export\s+)?(?:default\s+)?(?:declare\s+)?(?:abstract\s+)?(class|interface|enum)\s+([A-Za-z_$][\w$]*)|^\s*(?:export\s+)?(?:declare\s+)?(type)\s+([A-Za-z_$][\w$]*)\s*(?:<[^=]*>)?\s*=",
    )
}

fn re_function_decl() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(
        &RE,
        r"^\s*(?:export\s+)?(?:default\s+)?(?:async\s+)?function\s*\*?\s*([A-Za-z_$][\w$]*)\s*[(<]",
    )
}

fn re_binding() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r"\b(?:let|const|var)\s+([A-Za-z_$][\w$]*)\s*[=:]")
}

fn allows_pascal(file: &SourceFile) -> bool {
    matches!(file.extension.as_str(), "tsx" | "jsx")
}

fn file_name_hits(file: &SourceFile) -> Vec<RuleHit> {
    let stem = file.stem();
    let ok = stem.split('.').all(|segment| {
        is_kebab_case(segment)
            || is_camel_case(segment)
            || (allows_pascal(file) && is_pascal_case(segment))
    });
    if ok {
        vec![]
    } else {
        vec![RuleHit::whole_file(
            Severity::Low,
            "file",
            format!(
                "File name '{}' should be kebab-case or camelCase",
                file.file_name()
            ),
        )]
    }
}

fn type_name_hits(file: &SourceFile) -> Vec<RuleHit> {
    file.numbered_lines()
        .filter(|(_, line)| !is_comment_line(line))
        .filter_map(|(no, line)| {
            let caps = re_type_decl().captures(line)?;
            let (kind, name) = match (caps.get(1), caps.get(2)) {
                (Some(kind), Some(name)) => (kind.as_str(), name.as_str()),
                _ => (caps.get(3)?.as_str(), caps.get(4)?.as_str()),
            };
            (!is_pascal_case(name)).then(|| {
                RuleHit::at(
                    Severity::Medium,
                    kind,
                    no,
                    format!("{} '{}' should be PascalCase", kind, name),
                )
            })
        })
        .collect()
}

fn function_name_hits(file: &SourceFile) -> Vec<RuleHit> {
    file.numbered_lines()
        .filter(|(_, line)| !is_comment_line(line))
        .filter_map(|(no, line)| {
            let name = re_function_decl().captures(line)?.get(1)?.as_str();
            let ok = is_camel_case(name) || (allows_pascal(file) && is_pascal_case(name));
            (!ok).then(|| {
                RuleHit::at(
                    Severity::Low,
                    "function",
                    no,
                    format!("function '{}' should be camelCase", name),
                )
            })
        })
        .collect()
}

fn binding_hits(file: &SourceFile) -> Vec<RuleHit> {
    let mut hits = Vec::new();
    for (no, line) in file.numbered_lines() {
        if is_comment_line(line) {
            continue;
        }
        for caps in re_binding().captures_iter(line) {
            let name = &caps[1];
            let snake = name.trim_start_matches('_').contains('_');
            if snake && !is_upper_snake(name) {
                hits.push(RuleHit::at(
                    Severity::Low,
                    "variable",
                    no,
                    format!("binding '{}' should be camelCase or UPPER_SNAKE_CASE", name),
                ));
            }
        }
    }
    hits
}

pub fn rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(FnRule {
            id: "file-name",
            description: "File names are kebab-case or camelCase",
            check: file_name_hits,
        }),
        Box::new(FnRule {
            id: "type-name",
            description: "Classes, interfaces, enums and types are PascalCase",
            check: type_name_hits,
        }),
        Box::new(FnRule {
            id: "function-name",
            description: "Functions are camelCase",
            check: function_name_hits,
        }),
        Box::new(FnRule {
            id: "binding-name",
            description: "No snake_case bindings",
            check: binding_hits,
        }),
    ]
}

#[async_trait]
impl Validator for NamingValidator {
    fn name(&self) -> &'static str {
        "naming"
    }

    fn description(&self) -> &'static str {
        "Naming conventions for files, types, functions and bindings"
    }

    async fn validate(
        &self,
        ctx: &ProjectContext,
        sink: &mut FindingSink,
    ) -> Result<PassSummary, WardenError> {
        let files = ctx.corpus.scan(&ScanFilter::sources(&ctx.config)).await?;
        let rules = rules();
        for file in files.iter().filter(|f| !f.is_declaration()) {
            apply_rules(&rules, file, sink);
        }
        Ok(PassSummary::empty().with_metric("files", files.len() as f64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(rel: &str, content: &str) -> Vec<RuleHit> {
        let file = SourceFile::virtual_file(rel, content);
        rules().iter().flat_map(|r| r.check(&file)).collect()
    }

    #[test]
    fn test_file_names() {
        assert!(check("src/order-service.ts", "").is_empty());
        assert!(check("src/orderService.test.ts", "").is_empty());
        assert!(check("src/components/CartItem.tsx", "").is_empty());
        let hits = check("src/Order_Service.ts", "");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].category, "file");
    }

    #[test]
    fn test_declarations() {
        let hits = check(
            "src/a.ts",
            "export class orderService {}\ninterface Cart {}\ntype cart_item = { id: string };\nfunction Do_thing() {}\nconst user_name = 'x';\nconst MAX_ITEMS = 3;\nlet _private = 1;\n",
        );
        let summary: Vec<_> = hits
            .iter()
            .map(|h| (h.category.as_str(), h.severity, h.line))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("class", Severity::Medium, Some(1)),
                ("type", Severity::Medium, Some(3)),
                ("function", Severity::Low, Some(4)),
                ("variable", Severity::Low, Some(5)),
            ]
        );
    }

    #[test]
    fn test_react_components_may_be_pascal_case() {
        assert!(check("src/components/cart.tsx", "export function CartItem() {}\n").is_empty());
        assert_eq!(check("src/cart.ts", "export function CartItem() {}\n").len(), 1);
    }
}
