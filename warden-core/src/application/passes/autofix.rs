// warden-core/src/application/passes/autofix.rs

// Analyze phase of auto-remediation. Every rule is a pure `content -> content`
// rewrite; the pass only reports which rules would change which files. The
// apply phase lives in `application::remediation`.

use crate::application::passes::debug_output::is_logger_module;
use crate::application::passes::is_server_file;
use crate::application::remediation::{FileEdit, FixPlan};
use crate::domain::finding::{FindingSink, Location, Severity};
use crate::domain::source::SourceFile;
use crate::domain::text::{
    blank_string_text, blank_strings, is_comment_line, is_upper_snake, static_regex,
    to_upper_snake,
};
use crate::error::WardenError;
use crate::ports::corpus::ScanFilter;
use crate::ports::validator::{PassSummary, ProjectContext, Validator};
use async_trait::async_trait;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

pub struct AutofixValidator;

pub const TOOL_CONFIG_RULE: &str = "tool-config";

const PRETTIER_DEFAULTS: &str = "{\n  \"semi\": true,\n  \"singleQuote\": true,\n  \"trailingComma\": \"es5\",\n  \"printWidth\": 100,\n  \"tabWidth\": 2\n}\n";

const ESLINT_IGNORE_DEFAULTS: &str = "node_modules/\ndist/\nbuild/\ncoverage/\n";

/// Tool configuration files created when absent.
pub const TOOL_CONFIG_FILES: [(&str, &str); 2] = [
    (".prettierrc", PRETTIER_DEFAULTS),
    (".eslintignore", ESLINT_IGNORE_DEFAULTS),
];

/// What a rewrite knows about the file besides its current content.
#[derive(Debug, Clone)]
pub struct FixTarget<'a> {
    pub rel_path: &'a str,
    pub logger_module: &'a str,
    pub server_side: bool,
    pub is_logger: bool,
}

/// A named, idempotent whole-file rewrite.
pub struct FixRule {
    pub id: &'static str,
    pub description: &'static str,
    pub applies_to: fn(&SourceFile) -> bool,
    pub rewrite: fn(&str, &FixTarget) -> String,
}

/// Rules in application order. Later rules never produce text an earlier rule
/// would rewrite again.
pub fn rules() -> Vec<FixRule> {
    vec![
        FixRule {
            id: "strict-types",
            description: "Replace `any` annotations with `unknown`",
            applies_to: SourceFile::is_typescript,
            rewrite: strict_types,
        },
        FixRule {
            id: "constant-case",
            description: "Upper-case module-level literal constants",
            applies_to: |_| true,
            rewrite: constant_case,
        },
        FixRule {
            id: "logger",
            description: "Route console calls through the project logger",
            applies_to: |_| true,
            rewrite: use_logger,
        },
        FixRule {
            id: "spacing",
            description: "Normalize spacing around commas, brackets and operators",
            applies_to: |f| !f.is_markup(),
            rewrite: spacing,
        },
        FixRule {
            id: "import-order",
            description: "Group imports: external, internal, then types",
            applies_to: |_| true,
            rewrite: import_order,
        },
        FixRule {
            id: "default-export",
            description: "Add a default export for the single exported symbol",
            applies_to: |_| true,
            rewrite: default_export,
        },
    ]
}

// --- helpers ---

fn map_lines(content: &str, f: impl Fn(&str) -> String) -> String {
    content.split('\n').map(f).collect::<Vec<_>>().join("\n")
}

/// Rewrites every match of `re` in the code part of `line`, outside string
/// literals and trailing comments.
fn rewrite_code(line: &str, re: &Regex, replace: impl Fn(&str) -> String) -> String {
    if is_comment_line(line) {
        return line.to_string();
    }
    let masked = blank_strings(line);
    let code_end = masked.find("//").unwrap_or(masked.len());
    let mut out = String::with_capacity(line.len());
    let mut last = 0;
    for m in re.find_iter(&masked[..code_end]) {
        let (Some(before), Some(matched)) = (line.get(last..m.start()), line.get(m.range())) else {
            return line.to_string();
        };
        out.push_str(before);
        out.push_str(&replace(matched));
        last = m.end();
    }
    out.push_str(line.get(last..).unwrap_or_default());
    out
}

fn re_import_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(
        &RE,
        r#"^import\s+(?:type\s+)?(?:[^'"]*?\s*from\s*)?['"]([^'"]+)['"]\s*;?\s*$"#,
    )
}

/// Lines `[start, end)` of the leading block of single-line imports.
fn leading_imports(lines: &[&str]) -> Option<(usize, usize)> {
    let start = lines
        .iter()
        .position(|l| !l.trim().is_empty() && !is_comment_line(l))?;
    if !re_import_line().is_match(lines[start]) {
        return None;
    }
    let mut end = start + 1;
    for (idx, line) in lines.iter().enumerate().skip(start + 1) {
        if re_import_line().is_match(line) {
            end = idx + 1;
        } else if !line.trim().is_empty() {
            break;
        }
    }
    Some((start, end))
}

// --- strict-types ---

fn re_any_annotation() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r":\s*any\b")
}

fn re_any_array() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r"\bany\[\]")
}

pub fn strict_types(content: &str, _: &FixTarget) -> String {
    map_lines(content, |line| {
        let line = rewrite_code(line, re_any_annotation(), |_| ": unknown".to_string());
        rewrite_code(&line, re_any_array(), |_| "unknown[]".to_string())
    })
}

// --- constant-case ---

fn re_literal_constant() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(
        &RE,
        r#"^const\s+([a-z][A-Za-z0-9_]*)\s*(?::\s*[\w\[\]<>| ]+)?=\s*(?:-?\d[\d_.]*|'[^'\\]*'|"[^"\\]*"|true|false|null)\s*;?\s*$"#,
    )
}

fn word_regex(word: &str) -> Option<Regex> {
    Regex::new(&format!(r"\b{}\b", regex::escape(word))).ok()
}

fn re_export_list() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r"\bexport\s*\{([^}]*)\}")
}

/// Local names listed in `export { a, b as c }` clauses.
fn exported_names(content: &str) -> BTreeSet<&str> {
    re_export_list()
        .captures_iter(content)
        .filter_map(|c| c.get(1))
        .flat_map(|list| list.as_str().split(','))
        .filter_map(|item| item.split_whitespace().next())
        .collect()
}

/// A line holding nothing but `name` or `name,`: a shorthand property or an
/// argument of a multi-line call, which one line cannot tell apart.
fn stands_alone(content: &str, name: &str) -> bool {
    content
        .lines()
        .any(|l| l.trim().trim_end_matches(',').trim_end() == name)
}

/// Innermost bracket left open before `end`, with its offset.
fn enclosing_opener(code: &[u8], end: usize) -> Option<(usize, u8)> {
    let mut depth = 0usize;
    for idx in (0..end).rev() {
        match code[idx] {
            b')' | b']' | b'}' => depth += 1,
            b'(' | b'[' | b'{' if depth == 0 => return Some((idx, code[idx])),
            b'(' | b'[' | b'{' => depth -= 1,
            _ => {}
        }
    }
    None
}

enum Occurrence {
    Rename,
    /// `{ name }` in an object literal: the key must survive.
    Shorthand,
    /// Property access or object key.
    Keep,
}

fn classify(masked: &str, start: usize, end: usize) -> Occurrence {
    let before = &masked[..start];
    if before.ends_with('.') && !before.ends_with("...") {
        return Occurrence::Keep;
    }
    let prev = before.trim_end().bytes().last();
    let next = masked[end..].trim_start().bytes().next();
    let opens_item = matches!(prev, None | Some(b'{') | Some(b','));
    if opens_item && next == Some(b':') {
        return Occurrence::Keep;
    }
    if opens_item && matches!(next, Some(b'}') | Some(b',')) {
        let code = masked.as_bytes();
        if let Some((idx, b'{')) = enclosing_opener(code, start)
            && (idx == 0 || code[idx - 1] != b'$')
        {
            return Occurrence::Shorthand;
        }
    }
    Occurrence::Rename
}

/// Renames whole-word uses of `from`. String text is skipped, template
/// interpolations are not.
fn rename_in_line(line: &str, from: &Regex, to: &str) -> String {
    let masked = blank_string_text(line);
    let mut out = String::with_capacity(line.len());
    let mut last = 0;
    for m in from.find_iter(&masked) {
        let replacement = match classify(&masked, m.start(), m.end()) {
            Occurrence::Keep => continue,
            Occurrence::Rename => to.to_string(),
            Occurrence::Shorthand => format!("{}: {}", m.as_str(), to),
        };
        let Some(before) = line.get(last..m.start()) else {
            return line.to_string();
        };
        out.push_str(before);
        out.push_str(&replacement);
        last = m.end();
    }
    out.push_str(line.get(last..).unwrap_or_default());
    out
}

pub fn constant_case(content: &str, _: &FixTarget) -> String {
    let exported = exported_names(content);
    let names: BTreeSet<&str> = content
        .lines()
        .filter_map(|l| re_literal_constant().captures(l))
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .filter(|n| !is_upper_snake(n) && !exported.contains(n) && !stands_alone(content, n))
        .collect();

    let mut current = content.to_string();
    for name in names {
        let renamed = to_upper_snake(name);
        let (Some(from), Some(clash)) = (word_regex(name), word_regex(&renamed)) else {
            continue;
        };
        if clash.is_match(&current) {
            continue;
        }
        current = map_lines(&current, |line| {
            if re_import_line().is_match(line) {
                line.to_string()
            } else {
                rename_in_line(line, &from, &renamed)
            }
        });
    }
    current
}

// --- logger ---

fn re_console_call() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r"\bconsole\.(?:log|info|warn|error|debug)\s*\(")
}

fn re_logger_binding() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(
        &RE,
        r#"(?m)^\s*import\s+(?:\{[^}]*\blogger\b[^}]*\}|logger)\s+from\b|\b(?:const|let|var)\s+(?:\{[^}]*\blogger\b[^}]*\}|logger)\s*=\s*require\b"#,
    )
}

/// Module specifier of `target` (extension-less, project-relative) as seen from `from_rel`.
pub fn relative_module(from_rel: &str, target: &str) -> String {
    let mut from_dirs: Vec<&str> = from_rel.split('/').collect();
    from_dirs.pop();
    let target_segs: Vec<&str> = target.split('/').collect();
    let common = from_dirs
        .iter()
        .zip(&target_segs)
        .take_while(|(a, b)| a == b)
        .count()
        .min(target_segs.len().saturating_sub(1));
    let ups = from_dirs.len() - common;
    let rest = target_segs[common..].join("/");
    if ups == 0 {
        format!("./{}", rest)
    } else {
        format!("{}{}", "../".repeat(ups), rest)
    }
}

pub fn use_logger(content: &str, target: &FixTarget) -> String {
    if target.is_logger || !target.server_side {
        return content.to_string();
    }
    let rewritten = map_lines(content, |line| {
        rewrite_code(line, re_console_call(), |call| {
            let call = call.replacen("console.", "logger.", 1);
            call.replacen("logger.log", "logger.info", 1)
        })
    });
    if rewritten == content || re_logger_binding().is_match(&rewritten) {
        return rewritten;
    }

    let import = format!(
        "import {{ logger }} from '{}';",
        relative_module(target.rel_path, target.logger_module)
    );
    let mut lines: Vec<&str> = rewritten.split('\n').collect();
    match leading_imports(&lines) {
        Some((_, end)) => lines.insert(end, &import),
        None => {
            lines.insert(0, "");
            lines.insert(0, &import);
        }
    }
    lines.join("\n")
}

// --- spacing ---

fn is_blank(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

fn skip_blanks(code: &[u8], mut i: usize, end: usize) -> usize {
    while i < end && is_blank(code[i]) {
        i += 1;
    }
    i
}

/// Drops trailing blanks, but never the indentation of an otherwise empty line.
fn trim_blanks(out: &mut Vec<u8>) {
    if out.iter().all(|b| is_blank(*b)) {
        return;
    }
    while out.last().is_some_and(|b| is_blank(*b)) {
        out.pop();
    }
}

/// Length of the equality/assignment/arrow operator starting at `i`.
fn operator_at(code: &[u8], i: usize, end: usize) -> Option<usize> {
    let rest = &code[i..end];
    if rest.starts_with(b"===") || rest.starts_with(b"!==") {
        return Some(3);
    }
    if rest.starts_with(b"==") || rest.starts_with(b"!=") || rest.starts_with(b"=>") {
        return Some(2);
    }
    if rest.first() != Some(&b'=') {
        return None;
    }
    // Compound assignments and comparisons (`+=`, `<=`, `??=`) stay as written
    let compound = i.checked_sub(1).is_some_and(|p| {
        matches!(
            code[p],
            b'<' | b'>' | b'+' | b'-' | b'*' | b'/' | b'%' | b'&' | b'|' | b'^' | b'?' | b'=' | b'!'
        )
    });
    (!compound).then_some(1)
}

pub fn space_line(line: &str) -> String {
    if line.trim().is_empty() || is_comment_line(line) {
        return line.to_string();
    }
    let masked = blank_strings(line);
    let code_end = [masked.find("//"), masked.find("/*")]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(masked.len());
    let code = masked.as_bytes();
    let orig = line.as_bytes();
    let has_comment = code_end < orig.len();

    let mut out: Vec<u8> = Vec::with_capacity(line.len() + 8);
    let mut i = 0;
    while i < code_end {
        match code[i] {
            b',' => {
                trim_blanks(&mut out);
                out.push(b',');
                i = skip_blanks(code, i + 1, code_end);
                let closes = i < code_end && matches!(code[i], b')' | b']');
                if (i < code_end && !closes) || (i == code_end && has_comment) {
                    out.push(b' ');
                }
            }
            b'(' | b'[' => {
                out.push(orig[i]);
                i = skip_blanks(code, i + 1, code_end);
                if i == code_end && has_comment {
                    out.push(b' ');
                }
            }
            b')' | b']' => {
                trim_blanks(&mut out);
                out.push(orig[i]);
                i += 1;
            }
            b'=' | b'!' => match operator_at(code, i, code_end) {
                Some(len) => {
                    trim_blanks(&mut out);
                    if !out.iter().all(|b| is_blank(*b)) {
                        out.push(b' ');
                    }
                    out.extend_from_slice(&orig[i..i + len]);
                    i = skip_blanks(code, i + len, code_end);
                    if i < code_end || has_comment {
                        out.push(b' ');
                    }
                }
                None => {
                    out.push(orig[i]);
                    i += 1;
                }
            },
            _ => {
                out.push(orig[i]);
                i += 1;
            }
        }
    }
    out.extend_from_slice(&orig[code_end..]);
    String::from_utf8(out).unwrap_or_else(|_| line.to_string())
}

/// Whether a `/* ... */` comment is still open at the end of `line`.
fn block_comment_open(line: &str, mut open: bool) -> bool {
    let masked = blank_strings(line);
    let mut at = 0;
    loop {
        if open {
            // Comment text is scanned raw: quotes inside it mean nothing
            match line.get(at..).and_then(|rest| rest.find("*/")) {
                Some(idx) => {
                    open = false;
                    at += idx + 2;
                }
                None => return true,
            }
        } else {
            let Some(rest) = masked.get(at..) else {
                return false;
            };
            match (rest.find("//"), rest.find("/*")) {
                (_, None) => return false,
                (Some(line_comment), Some(block)) if line_comment < block => return false,
                (_, Some(block)) => {
                    open = true;
                    at += block + 2;
                }
            }
        }
    }
}

pub fn spacing(content: &str, _: &FixTarget) -> String {
    let mut in_comment = false;
    content
        .split('\n')
        .map(|line| {
            let inside = in_comment;
            in_comment = block_comment_open(line, in_comment);
            if inside {
                line.to_string()
            } else {
                space_line(line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// --- import-order ---

#[derive(Clone, Copy, PartialEq, Eq)]
enum ImportGroup {
    External,
    Internal,
    Types,
}

fn import_group(line: &str) -> ImportGroup {
    let trimmed = line.trim_start();
    if trimmed.starts_with("import type ") {
        return ImportGroup::Types;
    }
    let spec = re_import_line()
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or_default();
    if spec.starts_with('.') || spec.starts_with("@/") || spec.starts_with("~/") {
        ImportGroup::Internal
    } else {
        ImportGroup::External
    }
}

pub fn import_order(content: &str, _: &FixTarget) -> String {
    let lines: Vec<&str> = content.split('\n').collect();
    let Some((start, end)) = leading_imports(&lines) else {
        return content.to_string();
    };
    let block = &lines[start..end];

    let mut rebuilt: Vec<&str> = Vec::with_capacity(block.len() + 2);
    for group in [ImportGroup::External, ImportGroup::Internal, ImportGroup::Types] {
        let members: Vec<&str> = block
            .iter()
            .filter(|l| !l.trim().is_empty() && import_group(l) == group)
            .copied()
            .collect();
        if members.is_empty() {
            continue;
        }
        if !rebuilt.is_empty() {
            rebuilt.push("");
        }
        rebuilt.extend(members);
    }
    if rebuilt == block {
        return content.to_string();
    }

    let mut out: Vec<&str> = lines[..start].to_vec();
    out.extend(rebuilt);
    out.extend_from_slice(&lines[end..]);
    out.join("\n")
}

// --- default-export ---

fn re_exported_declaration() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(
        &RE,
        r"^export\s+(?:async\s+)?(?:abstract\s+)?(?:class|function\s*\*?|const|let|var)\s+([A-Za-z_$][\w$]*)",
    )
}

fn re_other_export() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(
        &RE,
        r"(?m)^export\s+(?:default\b|\{|\*|=)|\bmodule\.exports\b|^export\s+(?:declare\s+)?(?:interface|type|enum)\b",
    )
}

pub fn default_export(content: &str, _: &FixTarget) -> String {
    if re_other_export().is_match(content) {
        return content.to_string();
    }
    let exported: Vec<&str> = content
        .lines()
        .filter_map(|l| re_exported_declaration().captures(l))
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();
    match exported.as_slice() {
        [name] => format!("{}\n\nexport default {};\n", content.trim_end(), name),
        _ => content.to_string(),
    }
}

// --- plan ---

/// Runs every rule over the project and collects the pending edits.
pub async fn build_plan(ctx: &ProjectContext) -> Result<FixPlan, WardenError> {
    let config = &ctx.config;
    let files = ctx.corpus.scan(&ScanFilter::sources(config)).await?;
    let rules = rules();
    let mut edits = Vec::new();

    for file in files.iter().filter(|f| !f.is_test() && !f.is_declaration()) {
        let target = FixTarget {
            rel_path: &file.rel_path,
            logger_module: &config.logger_module,
            server_side: is_server_file(config, file),
            is_logger: is_logger_module(config, file),
        };
        let mut content = file.content.clone();
        let mut applied = Vec::new();
        for rule in rules.iter().filter(|r| (r.applies_to)(file)) {
            let next = (rule.rewrite)(&content, &target);
            if next != content {
                applied.push(rule.id);
                content = next;
            }
        }
        if !applied.is_empty() {
            edits.push(FileEdit {
                rel_path: file.rel_path.clone(),
                original: Some(file.content.clone()),
                updated: content,
                rules: applied,
            });
        }
    }

    for (name, defaults) in TOOL_CONFIG_FILES {
        if !ctx.corpus.exists(name) {
            edits.push(FileEdit {
                rel_path: name.to_string(),
                original: None,
                updated: defaults.to_string(),
                rules: vec![TOOL_CONFIG_RULE],
            });
        }
    }

    Ok(FixPlan { edits })
}

fn rule_description(id: &str) -> &'static str {
    rules()
        .into_iter()
        .find(|r| r.id == id)
        .map(|r| r.description)
        .unwrap_or("Create missing tool configuration with defaults")
}

#[async_trait]
impl Validator for AutofixValidator {
    fn name(&self) -> &'static str {
        "autofix"
    }

    fn description(&self) -> &'static str {
        "Pending automatic fixes (apply with `warden fix`)"
    }

    async fn validate(
        &self,
        ctx: &ProjectContext,
        sink: &mut FindingSink,
    ) -> Result<PassSummary, WardenError> {
        let plan = build_plan(ctx).await?;
        for edit in &plan.edits {
            for rule in &edit.rules {
                sink.emit(
                    Severity::Low,
                    format!("autofix:{}", rule),
                    Location::file(edit.rel_path.clone()),
                    rule_description(rule),
                );
            }
        }
        Ok(PassSummary::empty()
            .with_metric("files", plan.len() as f64)
            .with_metric("fixes", plan.rule_hits() as f64))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::application::passes::testing_support::{project, run_pass};
    use anyhow::Result;

    fn target(rel_path: &str) -> FixTarget<'_> {
        FixTarget {
            rel_path,
            logger_module: "src/utils/logger",
            server_side: true,
            is_logger: false,
        }
    }

    fn assert_idempotent(rewrite: fn(&str, &FixTarget) -> String, input: &str) -> String {
        let t = target("src/services/a.ts");
        let once = rewrite(input, &t);
        assert_eq!(rewrite(&once, &t), once, "rule is not idempotent");
        once
    }

    #[test]
    fn test_strict_types() {
        let out = assert_idempotent(
            strict_types,
            "function f(a: any, b:any[]): any {\n  const s = 'x: any';\n  return a as any;\n}\n",
        );
        assert_eq!(
            out,
            "function f(a: unknown, b: unknown[]): unknown {\n  const s = 'x: any';\n  return a as any;\n}\n"
        );
    }

    #[test]
    fn test_constant_case_renames_every_use() {
        let out = assert_idempotent(
            constant_case,
            "const maxItems = 20;\nexport const limit = 3;\nfunction take(list) {\n  return list.slice(0, maxItems).maxItems;\n}\nconst msg = 'maxItems';\n",
        );
        assert_eq!(
            out,
            "const MAX_ITEMS = 20;\nexport const limit = 3;\nfunction take(list) {\n  return list.slice(0, MAX_ITEMS).maxItems;\n}\nconst MSG = 'maxItems';\n"
        );
    }

    #[test]
    fn test_constant_case_renames_inside_template_interpolations() {
        let out = assert_idempotent(
            constant_case,
            "const baseUrl = 'https://shop.example.com';\nexport function itemUrl(id) {\n  return `${baseUrl}/items/${id}?src=baseUrl`;\n}\n",
        );
        assert_eq!(
            out,
            "const BASE_URL = 'https://shop.example.com';\nexport function itemUrl(id) {\n  return `${BASE_URL}/items/${id}?src=baseUrl`;\n}\n"
        );
    }

    #[test]
    fn test_constant_case_keeps_export_list_names() {
        let input = "const pageSize = 20;\nconst maxPages = 5;\nexport { pageSize, maxPages as pages };\n";
        assert_eq!(constant_case(input, &target("src/a.ts")), input);
    }

    #[test]
    fn test_constant_case_keeps_object_keys() {
        let out = assert_idempotent(
            constant_case,
            "const retries = 3;\nconst timeout = 500;\nexport const opts = { retries, wait: timeout, timeout: 1 };\n",
        );
        assert_eq!(
            out,
            "const RETRIES = 3;\nconst TIMEOUT = 500;\nexport const opts = { retries: RETRIES, wait: TIMEOUT, timeout: 1 };\n"
        );
    }

    #[test]
    fn test_constant_case_skips_names_alone_on_a_line() {
        let input = "const retries = 3;\nexport const opts = {\n  retries,\n};\n";
        assert_eq!(constant_case(input, &target("src/a.ts")), input);
    }

    #[test]
    fn test_constant_case_skips_clashes() {
        let input = "const retries = 3;\nconst RETRIES = 4;\n";
        assert_eq!(constant_case(input, &target("src/a.ts")), input);
    }

    #[test]
    fn test_logger_rewrite_adds_import() {
        let out = assert_idempotent(
            use_logger,
            "import express from 'express';\n\nconsole.log('up');\nconsole.error('down');\n",
        );
        assert_eq!(
            out,
            "import express from 'express';\nimport { logger } from '../utils/logger';\n\nlogger.info('up');\nlogger.error('down');\n"
        );
    }

    #[test]
    fn test_logger_skips_client_code() {
        let mut t = target("src/frontend/app.ts");
        t.server_side = false;
        let input = "console.log('client');\n";
        assert_eq!(use_logger(input, &t), input);
    }

    #[test]
    fn test_relative_module() {
        assert_eq!(relative_module("src/services/cart.ts", "src/utils/logger"), "../utils/logger");
        assert_eq!(relative_module("src/server.ts", "src/utils/logger"), "./utils/logger");
        assert_eq!(relative_module("src/utils/http.ts", "src/utils/logger"), "./logger");
    }

    #[test]
    fn test_spacing() {
        assert_eq!(space_line("const f = (a,b)=>a===b;"), "const f = (a, b) => a === b;");
        assert_eq!(space_line("call( x ,  y )"), "call(x, y)");
        assert_eq!(space_line("if (a!=b && c<=d) x+=1;"), "if (a != b && c<=d) x+=1;");
        assert_eq!(space_line("const s='a,b=c'; // x=1"), "const s = 'a,b=c'; // x=1");
        assert_eq!(space_line("    => done"), "    => done");
        assert_idempotent(spacing, "let a=[1,2 ,3];\nfoo(a,\n  b);\n");
    }

    #[test]
    fn test_spacing_leaves_block_comments_alone() {
        let input = "/*\n  usage: total=sum(a,b)\n  it's fine,really\n*/\nlet x=1; /* a=b,\nc=d */\nlet y=2;\n";
        let out = assert_idempotent(spacing, input);
        assert_eq!(
            out,
            "/*\n  usage: total=sum(a,b)\n  it's fine,really\n*/\nlet x = 1; /* a=b,\nc=d */\nlet y = 2;\n"
        );
    }

    #[test]
    fn test_import_order() {
        let out = assert_idempotent(
            import_order,
            "// header\nimport type { Cart } from './types';\nimport { db } from '../db';\n\nimport express from 'express';\nimport cors from 'cors';\n\nconst app = express();\n",
        );
        assert_eq!(
            out,
            "// header\nimport express from 'express';\nimport cors from 'cors';\n\nimport { db } from '../db';\n\nimport type { Cart } from './types';\n\nconst app = express();\n"
        );
    }

    #[test]
    fn test_default_export() {
        let out = assert_idempotent(default_export, "export class CartService {}\n");
        assert_eq!(out, "export class CartService {}\n\nexport default CartService;\n");

        let two = "export const a = 1;\nexport function b() {}\n";
        assert_eq!(default_export(two, &target("src/a.ts")), two);
    }

    #[tokio::test]
    async fn test_pending_fixes_are_low_findings() -> Result<()> {
        let (_dir, ctx) = project(&[
            ("src/services/cart.ts", "export class Cart {\n  items: any[] = [];\n}\n"),
            (".prettierrc", "{}\n"),
        ])?;
        let (sink, summary) = run_pass(&AutofixValidator, &ctx).await?;

        let categories: Vec<_> = sink.findings().iter().map(|f| f.category.as_str()).collect();
        assert_eq!(
            categories,
            vec!["autofix:strict-types", "autofix:default-export", "autofix:tool-config"]
        );
        assert!(sink.findings().iter().all(|f| f.severity == Severity::Low));
        assert_eq!(sink.findings()[2].file, ".eslintignore");
        assert_eq!(summary.metrics["files"], 2.0);
        Ok(())
    }
}
