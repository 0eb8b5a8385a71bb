// warden-core/src/infrastructure/config/env_files.rs

use std::collections::BTreeSet;

/// Declaration files, in the order they are read. Absent files declare nothing.
pub const ENV_FILES: [&str; 4] = [".env.example", ".env.sample", ".env.template", ".env"];

/// Variable names declared in a dotenv file. Values are never kept.
pub fn declared_names(content: &str) -> BTreeSet<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (name, _) = line.split_once('=')?;
            let name = name.trim();
            is_env_name(name).then(|| name.to_string())
        })
        .collect()
}

fn is_env_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_names_ignore_values_and_comments() {
        let names = declared_names(
            "# database\nDATABASE_URL=postgres://u:p@host/db\nexport JWT_SECRET=abc\n\nPORT = 3000\nnot a line\n",
        );
        let names: Vec<_> = names.iter().map(String::as_str).collect();
        assert_eq!(names, vec!["DATABASE_URL", "JWT_SECRET", "PORT"]);
    }

    #[test]
    fn test_invalid_names_are_skipped() {
        assert!(declared_names("1ABC=x\nA-B=y\n").is_empty());
    }
}
