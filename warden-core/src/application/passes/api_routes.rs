// warden-core/src/application/passes/api_routes.rs

use crate::application::passes::is_server_file;
use crate::domain::finding::{FindingSink, Location, Severity};
use crate::domain::graph::resolve;
use crate::domain::source::SourceFile;
use crate::domain::text::{is_comment_line, static_regex};
use crate::error::WardenError;
use crate::ports::corpus::ScanFilter;
use crate::ports::validator::{PassSummary, ProjectContext, Validator};
use async_trait::async_trait;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

pub struct ApiRoutesValidator;

/// Lines after a `fetch(` call searched for its `method:` option.
const METHOD_WINDOW: usize = 4;

fn re_route() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(
        &RE,
        r#"\b(?:router|app)\.(get|post|put|patch|delete)\s*\(\s*['"`]([^'"`]+)['"`]"#,
    )
}

fn re_mount() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(
        &RE,
        r#"\bapp\.use\s*\(\s*['"`]([^'"`]+)['"`]\s*,\s*([A-Za-z_$][\w$]*)\s*\)"#,
    )
}

fn re_binding_import() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(
        &RE,
        r#"\bimport\s+([A-Za-z_$][\w$]*)\s+from\s+['"](\.[^'"]*)['"]|\b(?:const|let|var)\s+([A-Za-z_$][\w$]*)\s*=\s*require\s*\(\s*['"](\.[^'"]*)['"]\s*\)"#,
    )
}

fn re_fetch() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r#"\bfetch\s*\(\s*['"`]([^'"`]+)['"`]"#)
}

fn re_axios() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(
        &RE,
        r#"\baxios\.(get|post|put|patch|delete)\s*\(\s*['"`]([^'"`]+)['"`]"#,
    )
}

fn re_method_option() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r#"\bmethod\s*:\s*['"`](\w+)['"`]"#)
}

/// A backend route or a front-end call: method, full path and where it was seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub method: String,
    pub path: String,
    pub file: String,
    pub line: usize,
}

impl Endpoint {
    fn location(&self) -> Location {
        Location::line(self.file.clone(), self.line)
    }
}

fn join_route(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    match (prefix.is_empty(), path.is_empty()) {
        (true, true) => "/".to_string(),
        (true, false) => format!("/{}", path),
        (false, true) => prefix.to_string(),
        (false, false) => format!("{}/{}", prefix, path),
    }
}

fn segments(path: &str) -> Vec<&str> {
    path.split(['?', '#'])
        .next()
        .unwrap_or(path)
        .split('/')
        .filter(|s| !s.is_empty())
        .collect()
}

/// `:param` on the route side and `${...}` on the call side match any segment.
pub fn paths_match(route: &str, call: &str) -> bool {
    let route = segments(route);
    let call = segments(call);
    route.len() == call.len()
        && route
            .iter()
            .zip(&call)
            .all(|(r, c)| r.starts_with(':') || c.contains("${") || r == c)
}

/// Target file -> mount prefixes, from every `app.use('<prefix>', ident)` whose
/// ident comes from a relative import.
pub fn mount_prefixes(files: &[SourceFile], default_extension: &str) -> BTreeMap<String, Vec<String>> {
    let mut mounts: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for file in files {
        let bindings: BTreeMap<&str, &str> = re_binding_import()
            .captures_iter(&file.content)
            .filter_map(|caps| {
                let ident = caps.get(1).or_else(|| caps.get(3))?;
                let spec = caps.get(2).or_else(|| caps.get(4))?;
                Some((ident.as_str(), spec.as_str()))
            })
            .collect();
        for caps in re_mount().captures_iter(&file.content) {
            let Some(spec) = bindings.get(&caps[2]) else {
                continue;
            };
            if let Some(target) = resolve(&file.rel_path, spec, default_extension) {
                mounts.entry(target).or_default().push(caps[1].to_string());
            }
        }
    }
    mounts
}

pub fn backend_routes(files: &[SourceFile], mounts: &BTreeMap<String, Vec<String>>) -> Vec<Endpoint> {
    let root = vec![String::new()];
    let mut routes = Vec::new();
    for file in files {
        let prefixes = mounts.get(&file.rel_path).unwrap_or(&root);
        for (no, line) in file.numbered_lines() {
            if is_comment_line(line) {
                continue;
            }
            for caps in re_route().captures_iter(line) {
                for prefix in prefixes {
                    routes.push(Endpoint {
                        method: caps[1].to_uppercase(),
                        path: join_route(prefix, &caps[2]),
                        file: file.rel_path.clone(),
                        line: no,
                    });
                }
            }
        }
    }
    routes
}

pub fn frontend_calls(files: &[SourceFile]) -> Vec<Endpoint> {
    let mut calls = Vec::new();
    for file in files {
        let lines: Vec<&str> = file.content.lines().collect();
        for (idx, line) in lines.iter().enumerate() {
            if is_comment_line(line) {
                continue;
            }
            for caps in re_fetch().captures_iter(line) {
                let method = lines[idx..]
                    .iter()
                    .take(METHOD_WINDOW + 1)
                    .enumerate()
                    .take_while(|(offset, l)| *offset == 0 || !l.contains("fetch("))
                    .find_map(|(_, l)| re_method_option().captures(l))
                    .map(|m| m[1].to_uppercase())
                    .unwrap_or_else(|| "GET".to_string());
                calls.push(Endpoint {
                    method,
                    path: caps[1].to_string(),
                    file: file.rel_path.clone(),
                    line: idx + 1,
                });
            }
            for caps in re_axios().captures_iter(line) {
                calls.push(Endpoint {
                    method: caps[1].to_uppercase(),
                    path: caps[2].to_string(),
                    file: file.rel_path.clone(),
                    line: idx + 1,
                });
            }
        }
    }
    calls.retain(|c| c.path == "/api" || c.path.starts_with("/api/"));
    calls
}

#[async_trait]
impl Validator for ApiRoutesValidator {
    fn name(&self) -> &'static str {
        "api-routes"
    }

    fn description(&self) -> &'static str {
        "Front-end API calls matched against backend route definitions"
    }

    async fn validate(
        &self,
        ctx: &ProjectContext,
        sink: &mut FindingSink,
    ) -> Result<PassSummary, WardenError> {
        let config = &ctx.config;
        let mut filter = ScanFilter::sources(config);
        filter.extensions.push("html".to_string());
        let files: Vec<SourceFile> = ctx
            .corpus
            .scan(&filter)
            .await?
            .into_iter()
            .filter(|f| !f.is_test())
            .collect();

        let server_files: Vec<SourceFile> = files
            .iter()
            .filter(|f| is_server_file(config, f))
            .cloned()
            .collect();
        let mounts = mount_prefixes(&server_files, &config.default_extension);
        let routes = backend_routes(&server_files, &mounts);
        let calls = frontend_calls(&files);

        let mut called: BTreeSet<usize> = BTreeSet::new();
        for call in &calls {
            let matched: Vec<usize> = routes
                .iter()
                .enumerate()
                .filter(|(_, r)| r.method == call.method && paths_match(&r.path, &call.path))
                .map(|(idx, _)| idx)
                .collect();
            if matched.is_empty() {
                sink.emit(
                    Severity::High,
                    "unmatched-call",
                    call.location(),
                    format!("{} {} has no matching backend route", call.method, call.path),
                );
            }
            called.extend(matched);
        }
        for (idx, route) in routes.iter().enumerate() {
            if !called.contains(&idx) {
                sink.emit(
                    Severity::Low,
                    "unused-route",
                    route.location(),
                    format!("{} {} is never called by the front end", route.method, route.path),
                );
            }
        }

        Ok(PassSummary::empty()
            .with_metric("routes", routes.len() as f64)
            .with_metric("calls", calls.len() as f64))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::application::passes::testing_support::{project, run_pass};
    use anyhow::Result;

    #[test]
    fn test_paths_match() {
        assert!(paths_match("/api/products/:id", "/api/products/${id}"));
        assert!(paths_match("/api/products/:id", "/api/products/42"));
        assert!(paths_match("/api/products", "/api/products/?page=2"));
        assert!(!paths_match("/api/products", "/api/products/1"));
        assert!(!paths_match("/api/orders", "/api/products"));
    }

    #[test]
    fn test_join_route() {
        assert_eq!(join_route("/api/products", "/"), "/api/products");
        assert_eq!(join_route("/api/products/", "/:id"), "/api/products/:id");
        assert_eq!(join_route("", "/health"), "/health");
    }

    #[tokio::test]
    async fn test_calls_against_mounted_routes() -> Result<()> {
        let (_dir, ctx) = project(&[
            (
                "src/server.ts",
                "import express from 'express';\nimport productRoutes from './routes/products';\nconst app = express();\napp.use('/api/products', productRoutes);\napp.get('/api/health', (req, res) => res.send('ok'));\n",
            ),
            (
                "src/routes/products.ts",
                "const router = Router();\nrouter.get('/', list);\nrouter.get('/:id', one);\nrouter.delete('/:id', remove);\nexport default router;\n",
            ),
            (
                "src/frontend/api.ts",
                "export const list = () => fetch('/api/products');\nexport const one = (id) => fetch(`/api/products/${id}`);\nexport const order = (o) => axios.post('/api/orders', o);\n\n\n\nexport async function removeProduct(id) {\n  return fetch(`/api/products/${id}`, {\n    method: 'DELETE',\n  });\n}\n",
            ),
        ])?;
        let (sink, summary) = run_pass(&ApiRoutesValidator, &ctx).await?;

        let unmatched: Vec<_> = sink.in_category("unmatched-call").collect();
        assert_eq!(unmatched.len(), 1);
        assert_eq!(unmatched[0].severity, Severity::High);
        assert!(unmatched[0].message.contains("POST /api/orders"));

        let unused: Vec<_> = sink.in_category("unused-route").collect();
        assert_eq!(unused.len(), 1);
        assert!(unused[0].message.contains("GET /api/health"));

        assert_eq!(summary.metrics["routes"], 4.0);
        assert_eq!(summary.metrics["calls"], 4.0);
        Ok(())
    }
}
