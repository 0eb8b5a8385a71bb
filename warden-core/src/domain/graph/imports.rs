// warden-core/src/domain/graph/imports.rs

use crate::domain::source::SourceFile;
use crate::domain::text::{line_of, static_regex};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

fn re_from() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r#"\bfrom\s+['"]([^'"]+)['"]"#)
}

/// One `from '<spec>'` linkage statement found in a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Linkage {
    pub line: usize,
    pub spec: String,
}

impl Linkage {
    pub fn is_relative(&self) -> bool {
        self.spec.starts_with('.')
    }
}

pub fn linkages(content: &str) -> Vec<Linkage> {
    re_from()
        .captures_iter(content)
        .filter_map(|cap| {
            let whole = cap.get(0)?;
            Some(Linkage {
                line: line_of(content, whole.start()),
                spec: cap[1].to_string(),
            })
        })
        .collect()
}

/// Resolves a relative linkage target against the importing file by string
/// concatenation and `.`/`..` folding.
///
/// When the last segment has no `.`, `default_extension` is appended. Directory
/// `index` files and `.js` -> `.ts` aliasing are not resolved, and neither are
/// targets such as `./order.service` whose last segment already contains a dot.
pub fn resolve(from_rel: &str, spec: &str, default_extension: &str) -> Option<String> {
    if !spec.starts_with('.') {
        return None;
    }
    let dir = match from_rel.rfind('/') {
        Some(idx) => &from_rel[..idx],
        None => "",
    };
    let mut resolved = join_normalized(dir, spec)?;
    let last = resolved.rsplit('/').next().filter(|l| !l.is_empty())?;
    if !last.contains('.') {
        resolved.push_str(default_extension);
    }
    Some(resolved)
}

/// Joins `rel` onto `dir` and folds `.`/`..` segments. `None` when the result
/// would climb above the project root.
pub fn join_normalized(dir: &str, rel: &str) -> Option<String> {
    let joined = if dir.is_empty() {
        rel.to_string()
    } else {
        format!("{}/{}", dir, rel)
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            other => segments.push(other),
        }
    }
    Some(segments.join("/"))
}

/// Directed file -> file graph of resolved relative linkage.
#[derive(Debug, Clone, Default)]
pub struct ImportGraph {
    // source -> (target -> first line of the linkage in source)
    edges: BTreeMap<String, BTreeMap<String, usize>>,
    reverse: BTreeMap<String, BTreeSet<String>>,
    nodes: BTreeSet<String>,
}

impl ImportGraph {
    pub fn build(files: &[SourceFile], default_extension: &str) -> Self {
        let nodes: BTreeSet<String> = files.iter().map(|f| f.rel_path.clone()).collect();
        let mut graph = Self {
            nodes,
            ..Self::default()
        };

        for file in files {
            for link in linkages(&file.content) {
                let Some(target) = resolve(&file.rel_path, &link.spec, default_extension) else {
                    continue;
                };
                // Edges only between files that are both in the corpus.
                if target == file.rel_path || !graph.nodes.contains(&target) {
                    continue;
                }
                graph
                    .edges
                    .entry(file.rel_path.clone())
                    .or_default()
                    .entry(target.clone())
                    .or_insert(link.line);
                graph
                    .reverse
                    .entry(target)
                    .or_default()
                    .insert(file.rel_path.clone());
            }
        }
        graph
    }

    pub fn contains(&self, file: &str) -> bool {
        self.nodes.contains(file)
    }

    pub fn imports_of(&self, file: &str) -> BTreeSet<&str> {
        self.edges
            .get(file)
            .map(|targets| targets.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn importers_of(&self, file: &str) -> BTreeSet<&str> {
        self.reverse
            .get(file)
            .map(|sources| sources.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// `(from, to, line)` for every edge, in path order.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, usize)> {
        self.edges.iter().flat_map(|(from, targets)| {
            targets
                .iter()
                .map(move |(to, line)| (from.as_str(), to.as_str(), *line))
        })
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(BTreeMap::len).sum()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Every pair of files that import each other, each unordered pair once
    /// (`a < b`). Longer cycles are not reported.
    pub fn mutual_pairs(&self) -> Vec<(String, String)> {
        self.edges()
            .filter(|(from, to, _)| from < to)
            .filter(|(from, to, _)| {
                self.edges
                    .get(*to)
                    .is_some_and(|targets| targets.contains_key(*from))
            })
            .map(|(from, to, _)| (from.to_string(), to.to_string()))
            .collect()
    }
}
