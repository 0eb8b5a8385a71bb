// warden-core/src/infrastructure/config/tsconfig.rs

use crate::infrastructure::error::InfrastructureError;
use serde::Deserialize;

pub const TSCONFIG_FILE: &str = "tsconfig.json";

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CompilerOptions {
    #[serde(default)]
    pub out_dir: Option<String>,
    #[serde(default)]
    pub root_dir: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TsConfig {
    #[serde(default)]
    pub compiler_options: CompilerOptions,
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl TsConfig {
    /// tsconfig files routinely carry comments and trailing commas.
    pub fn parse(content: &str) -> Result<Self, InfrastructureError> {
        let cleaned = strip_trailing_commas(&strip_json_comments(content));
        Ok(serde_json::from_str(&cleaned)?)
    }

    pub fn out_dir(&self) -> Option<&str> {
        self.compiler_options
            .out_dir
            .as_deref()
            .map(|d| d.trim_start_matches("./").trim_end_matches('/'))
    }
}

/// Directory part of an `include` glob: `src/**/*.ts` -> `src`.
pub fn include_base(pattern: &str) -> &str {
    let pattern = pattern.trim_start_matches("./");
    let cut = pattern
        .find(['*', '?', '{', '['])
        .unwrap_or(pattern.len());
    let base = &pattern[..cut];
    match base.rfind('/') {
        Some(idx) if cut < pattern.len() => &base[..idx],
        _ if cut < pattern.len() => "",
        _ => base.trim_end_matches('/'),
    }
}

fn strip_json_comments(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();
    let mut in_string = false;
    let mut escaped = false;

    while let Some(ch) = chars.next() {
        if in_string {
            out.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match (ch, chars.peek()) {
            ('"', _) => {
                in_string = true;
                out.push(ch);
            }
            ('/', Some('/')) => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
            }
            _ => out.push(ch),
        }
    }
    out
}

fn strip_trailing_commas(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let chars: Vec<char> = content.chars().collect();
    let mut in_string = false;
    let mut escaped = false;

    for (idx, &ch) in chars.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            out.push(ch);
            continue;
        }
        if ch == '"' {
            in_string = true;
        }
        if ch == ',' {
            let next = chars[idx + 1..].iter().find(|c| !c.is_whitespace());
            if matches!(next, Some('}') | Some(']')) {
                continue;
            }
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tolerates_comments_and_trailing_commas() {
        let config = TsConfig::parse(
            r#"{
                // compiler settings
                "compilerOptions": {
                    "outDir": "./dist/", /* emitted JS */
                    "rootDir": "src",
                },
                "include": ["src/**/*.ts", "types"],
            }"#,
        )
        .unwrap();

        assert_eq!(config.out_dir(), Some("dist"));
        assert_eq!(config.include, vec!["src/**/*.ts", "types"]);
    }

    #[test]
    fn test_comment_markers_inside_strings_survive() {
        let config = TsConfig::parse(r#"{ "include": ["src//legacy/*.ts"] }"#).unwrap();
        assert_eq!(config.include, vec!["src//legacy/*.ts"]);
    }

    #[test]
    fn test_include_base() {
        assert_eq!(include_base("src/**/*.ts"), "src");
        assert_eq!(include_base("./server/*"), "server");
        assert_eq!(include_base("types"), "types");
        assert_eq!(include_base("**/*.ts"), "");
    }

    #[test]
    fn test_malformed_tsconfig_is_an_error() {
        assert!(TsConfig::parse("{ \"include\": [").is_err());
    }
}
