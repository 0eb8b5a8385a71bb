// warden-core/src/domain/text.rs
//
// Line-oriented text helpers. Everything here works on raw text: there is no
// tokenizer, so strings containing braces or comment markers can fool them.

use regex::Regex;
use std::sync::OnceLock;

/// Compiles a hardcoded pattern once. An invalid pattern degrades to a regex that
/// never matches instead of panicking.
pub fn static_regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| {
        Regex::new(pattern).unwrap_or_else(|_| Regex::new("$^").unwrap_or_else(|_| unreachable!()))
    })
}

pub fn is_comment_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("//") || trimmed.starts_with("/*") || trimmed.starts_with('*')
}

/// 1-based line number of a byte offset.
pub fn line_of(content: &str, offset: usize) -> usize {
    let end = offset.min(content.len());
    content.as_bytes()[..end].iter().filter(|b| **b == b'\n').count() + 1
}

/// Replaces the contents of single-line string literals with spaces, keeping the
/// quotes, so structural scans do not see operators or braces inside strings.
pub fn blank_strings(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for ch in line.chars() {
        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                    push_blank(&mut out, ch);
                } else if ch == '\\' {
                    escaped = true;
                    out.push(' ');
                } else if ch == q {
                    quote = None;
                    out.push(ch);
                } else {
                    push_blank(&mut out, ch);
                }
            }
            None => {
                if ch == '\'' || ch == '"' || ch == '`' {
                    quote = Some(ch);
                }
                out.push(ch);
            }
        }
    }
    out
}

/// Like [`blank_strings`], but `${...}` interpolations inside template literals
/// stay visible as code.
pub fn blank_string_text(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut quote: Option<char> = None;
    let mut escaped = false;
    // Brace depth inside the current interpolation, 0 outside one
    let mut depth = 0usize;
    let mut chars = line.chars().peekable();
    while let Some(ch) = chars.next() {
        if depth > 0 {
            match ch {
                '{' => depth += 1,
                '}' => depth -= 1,
                _ => {}
            }
            out.push(ch);
            continue;
        }
        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                    push_blank(&mut out, ch);
                } else if ch == '\\' {
                    escaped = true;
                    out.push(' ');
                } else if ch == q {
                    quote = None;
                    out.push(ch);
                } else if q == '`' && ch == '$' && chars.peek() == Some(&'{') {
                    chars.next();
                    out.push_str("${");
                    depth = 1;
                } else {
                    push_blank(&mut out, ch);
                }
            }
            None => {
                if ch == '\'' || ch == '"' || ch == '`' {
                    quote = Some(ch);
                }
                out.push(ch);
            }
        }
    }
    out
}

// Byte length is preserved so offsets into the blanked line stay valid in the original.
fn push_blank(out: &mut String, ch: char) {
    for _ in 0..ch.len_utf8() {
        out.push(' ');
    }
}

/// Drops a trailing `//` comment (outside string literals).
pub fn strip_line_comment(line: &str) -> &str {
    let blanked = blank_strings(line);
    match blanked.find("//") {
        Some(idx) => &line[..idx],
        None => line,
    }
}

/// Index of the line that closes the block opened at or after `start`.
///
/// Braces are counted outside string literals; the block must open within
/// three lines of `start`, otherwise `None`.
pub fn block_end(lines: &[&str], start: usize) -> Option<usize> {
    let mut depth: i64 = 0;
    let mut opened = false;
    for (idx, line) in lines.iter().enumerate().skip(start) {
        let code = blank_strings(strip_line_comment(line));
        for ch in code.chars() {
            match ch {
                '{' => {
                    depth += 1;
                    opened = true;
                }
                '}' => depth -= 1,
                _ => {}
            }
        }
        if opened && depth <= 0 {
            return Some(idx);
        }
        if !opened && idx >= start + 2 {
            return None;
        }
    }
    None
}

pub fn is_pascal_case(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_alphanumeric())
}

pub fn is_camel_case(name: &str) -> bool {
    let trimmed = name.trim_start_matches(['_', '$']);
    let mut chars = trimmed.chars();
    chars.next().is_some_and(|c| c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '$')
}

pub fn is_kebab_case(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('-')
        && !name.ends_with('-')
        && !name.contains("--")
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

pub fn is_upper_snake(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_uppercase())
        && name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

/// `maxItems` -> `MAX_ITEMS`, `retry2Count` -> `RETRY2_COUNT`.
pub fn to_upper_snake(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower_or_digit = false;
    for ch in name.chars() {
        if ch.is_ascii_uppercase() && prev_lower_or_digit {
            out.push('_');
        }
        prev_lower_or_digit = ch.is_ascii_lowercase() || ch.is_ascii_digit();
        out.push(ch.to_ascii_uppercase());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_strings_keeps_quotes() {
        assert_eq!(blank_strings(r#"a = "x{y}" + 'z'"#), r#"a = "    " + ' '"#);
        assert_eq!(strip_line_comment("let a = 1; // note"), "let a = 1; ");
        assert_eq!(
            strip_line_comment("const url = 'http://x';"),
            "const url = 'http://x';"
        );
    }

    #[test]
    fn test_blank_string_text_keeps_interpolations() {
        assert_eq!(
            blank_string_text("return `${baseUrl}/items/${id}`;"),
            "return `${baseUrl}       ${id}`;"
        );
        assert_eq!(blank_string_text("`${a ? {x} : b}!`"), "`${a ? {x} : b} `");
        assert_eq!(blank_string_text("'a${b}'"), "'     '");
    }

    #[test]
    fn test_block_end() {
        let lines = vec!["function a() {", "  if (x) {", "  }", "}", "after"];
        assert_eq!(block_end(&lines, 0), Some(3));
        assert_eq!(block_end(&lines, 1), Some(2));
        assert_eq!(block_end(&["no braces", "here", "at", "all"], 0), None);
    }

    #[test]
    fn test_case_predicates() {
        assert!(is_pascal_case("OrderService"));
        assert!(!is_pascal_case("orderService"));
        assert!(is_camel_case("orderService"));
        assert!(is_camel_case("_private"));
        assert!(!is_camel_case("order_service"));
        assert!(is_kebab_case("order-service"));
        assert!(!is_kebab_case("Order-service"));
        assert!(is_upper_snake("MAX_ITEMS"));
        assert_eq!(to_upper_snake("maxItems"), "MAX_ITEMS");
        assert_eq!(to_upper_snake("apiBaseUrl"), "API_BASE_URL");
    }

    #[test]
    fn test_line_of() {
        assert_eq!(line_of("a\nb\nc", 0), 1);
        assert_eq!(line_of("a\nb\nc", 4), 3);
    }
}
