// warden-core/src/domain/rules.rs

use crate::domain::finding::{FindingSink, Location, Severity};
use crate::domain::source::SourceFile;
use crate::domain::text::is_comment_line;
use regex::Regex;

/// What a rule reports for one file. The pass turns hits into findings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleHit {
    pub severity: Severity,
    pub category: String,
    pub line: Option<usize>,
    pub message: String,
}

impl RuleHit {
    pub fn at(
        severity: Severity,
        category: impl Into<String>,
        line: usize,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category: category.into(),
            line: Some(line),
            message: message.into(),
        }
    }

    pub fn whole_file(
        severity: Severity,
        category: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category: category.into(),
            line: None,
            message: message.into(),
        }
    }
}

/// A named, independently testable predicate over one file.
pub trait Rule: Send + Sync {
    fn id(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn check(&self, file: &SourceFile) -> Vec<RuleHit>;
}

/// Line-by-line regex rule. Comment lines are skipped.
pub struct PatternRule {
    pub id: &'static str,
    pub description: &'static str,
    pub category: &'static str,
    pub severity: Severity,
    pub pattern: &'static Regex,
}

impl Rule for PatternRule {
    fn id(&self) -> &'static str {
        self.id
    }

    fn description(&self) -> &'static str {
        self.description
    }

    fn check(&self, file: &SourceFile) -> Vec<RuleHit> {
        file.numbered_lines()
            .filter(|(_, line)| !is_comment_line(line))
            .filter_map(|(no, line)| {
                self.pattern.find(line).map(|m| {
                    RuleHit::at(
                        self.severity,
                        self.category,
                        no,
                        format!("{} (`{}`)", self.description, m.as_str().trim()),
                    )
                })
            })
            .collect()
    }
}

/// Rule backed by a plain function, for checks that need more than one regex.
pub struct FnRule {
    pub id: &'static str,
    pub description: &'static str,
    pub check: fn(&SourceFile) -> Vec<RuleHit>,
}

impl Rule for FnRule {
    fn id(&self) -> &'static str {
        self.id
    }

    fn description(&self) -> &'static str {
        self.description
    }

    fn check(&self, file: &SourceFile) -> Vec<RuleHit> {
        (self.check)(file)
    }
}

/// Runs every rule over `file` and pushes the hits into the pass sink.
pub fn apply_rules(rules: &[Box<dyn Rule>], file: &SourceFile, sink: &mut FindingSink) -> usize {
    let mut count = 0;
    for rule in rules {
        for hit in rule.check(file) {
            let location = match hit.line {
                Some(line) => Location::line(file.rel_path.clone(), line),
                None => Location::file(file.rel_path.clone()),
            };
            sink.emit(hit.severity, hit.category, location, hit.message);
            count += 1;
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::text::static_regex;
    use std::sync::OnceLock;

    fn debugger_re() -> &'static Regex {
        static RE: OnceLock<Regex> = OnceLock::new();
        static_regex(&RE, r"\bdebugger\b")
    }

    fn no_tests(file: &SourceFile) -> Vec<RuleHit> {
        if file.content.contains("describe(") {
            vec![]
        } else {
            vec![RuleHit::whole_file(Severity::Low, "quality", "no suite")]
        }
    }

    #[test]
    fn test_pattern_rule_skips_comments() {
        let rule = PatternRule {
            id: "debugger",
            description: "Debugger statement",
            category: "debug",
            severity: Severity::Medium,
            pattern: debugger_re(),
        };
        let file = SourceFile::virtual_file("a.ts", "// debugger\nfoo();\ndebugger;\n");
        let hits = rule.check(&file);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].line, Some(3));
        assert_eq!(hits[0].message, "Debugger statement (`debugger`)");
    }

    #[test]
    fn test_apply_rules_emits_into_sink() {
        let rules: Vec<Box<dyn Rule>> = vec![Box::new(FnRule {
            id: "suite",
            description: "File declares a suite",
            check: no_tests,
        })];
        let mut sink = FindingSink::new("testing");
        let file = SourceFile::virtual_file("src/a.test.ts", "it('x', () => {})");

        assert_eq!(apply_rules(&rules, &file, &mut sink), 1);
        assert_eq!(sink.findings()[0].file, "src/a.test.ts");
        assert_eq!(sink.findings()[0].line, None);
        assert_eq!(rules[0].id(), "suite");
    }
}
