// warden-core/src/application/passes/security.rs
//
// OWASP-style posture check. Every finding is filed under one of ten fixed
// categories (A01..A10); each category is scored on its own and the overall
// score is their unweighted mean.

use crate::application::passes::{PASS_MARK, is_server_file, re_server_bootstrap};
use crate::domain::finding::{FindingSink, Location, Severity};
use crate::domain::rules::{FnRule, PatternRule, Rule, RuleHit, apply_rules};
use crate::domain::scoring::{BUCKET_FACTOR, CategoryScore, ScoreCard, mean};
use crate::domain::source::SourceFile;
use crate::domain::text::{is_comment_line, line_of, static_regex};
use crate::error::WardenError;
use crate::infrastructure::config::manifest::{LOCKFILES, MANIFEST_FILE, PackageManifest};
use crate::ports::corpus::ScanFilter;
use crate::ports::validator::{PassSummary, ProjectContext, Validator};
use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;

pub const CATEGORIES: [(&str, &str); 10] = [
    ("A01", "Broken Access Control"),
    ("A02", "Cryptographic Failures"),
    ("A03", "Injection"),
    ("A04", "Insecure Design"),
    ("A05", "Security Misconfiguration"),
    ("A06", "Vulnerable Components"),
    ("A07", "Authentication Failures"),
    ("A08", "Integrity Failures"),
    ("A09", "Logging Failures"),
    ("A10", "Server-Side Request Forgery"),
];

pub struct SecurityValidator;

// --- PATTERNS ---

pub(crate) fn re_hardcoded_secret() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(
        &RE,
        r#"(?i)\b(password|passwd|secret|token|api_?key)\s*[:=]\s*['"][^'"\s]{4,}['"]"#,
    )
}

fn re_key_material() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(
        &RE,
        r"sk_live_[0-9a-zA-Z]{10,}|AKIA[0-9A-Z]{16}|eyJ[A-Za-z0-9_-]{10,}\.[A-Za-z0-9_-]{10,}\.[A-Za-z0-9_-]{10,}|-----BEGIN (RSA |EC |OPENSSH )?PRIVATE KEY-----",
    )
}

fn re_weak_hash() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(
        &RE,
        r#"(?i)createHash\(\s*['"](md5|sha1)['"]|\b(md5|sha1)\s*\("#,
    )
}

fn re_symmetric_jwt() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r"\bHS(256|384|512)\b")
}

fn re_jwt_literal_secret() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r#"jwt\.sign\([^)]*,\s*['"][^'"]+['"]"#)
}

fn re_sql_concat() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(
        &RE,
        r#"(?i)\b(select\s.+\sfrom|insert\s+into|update\s+\w+\s+set|delete\s+from|where)\b.*(\$\{|['"`]\s*\+)"#,
    )
}

fn re_shell_exec() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(
        &RE,
        r"(?:^|[^.\w])(?:exec|execSync)\s*\(|\bchild_process\.exec(?:Sync)?\s*\(|\bspawn\([^)]*shell:\s*true|(?:^|[^.\w])eval\s*\(|\bnew\s+Function\s*\(",
    )
}

fn re_dom_sink() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(
        &RE,
        r"\.(innerHTML|outerHTML)\s*=[^=]|document\.write\s*\(|insertAdjacentHTML\s*\(|dangerouslySetInnerHTML",
    )
}

fn re_wildcard_cors() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(
        &RE,
        r#"origin\s*:\s*['"]\*['"]|Access-Control-Allow-Origin['"]\s*,\s*['"]\*['"]|\bcors\(\s*\)"#,
    )
}

fn re_empty_catch() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r"catch\s*(\([^)]*\))?\s*\{\s*\}")
}

fn re_logged_credential() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(
        &RE,
        r"(?i)\b(console|logger)\.\w+\(.*\b(password|passwd|secret|token|api_?key|authorization)\b",
    )
}

fn re_ssrf() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(
        &RE,
        r#"\b(?:fetch|axios(?:\.(?:get|post|put|patch|delete|request))?|https?\.(?:get|request)|got)\s*\(\s*(?:(?:[`'"][^`'"]*[`'"]|\w+)\s*\+\s*req\.(?:query|body|params|headers)|`[^`]*\$\{\s*req\.(?:query|body|params|headers))"#,
    )
}

fn re_cookie_call() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r"\bres\.cookie\s*\(")
}

fn re_upload_middleware() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r"\bmulter\s*\(")
}

fn re_mutating_route() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r"\b(router|app)\.(post|put|patch|delete)\s*\(")
}

fn re_auth_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(
        &RE,
        r"(?i)\b(authenticate\w*|requireAuth|isAuthenticated|verifyToken|authMiddleware|requireAdmin|ensureAuth\w*|protect)\b",
    )
}

fn re_rate_limit() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r"(?i)rate-?limit|slowDown")
}

fn re_external_script() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r#"(?i)<script\b[^>]*\bsrc\s*=\s*["'](https?:)?//[^"']+["'][^>]*>"#)
}

// --- MULTI-LINE RULES ---

/// Lines `start..start + window` joined, for option objects spread over several lines.
fn window(lines: &[&str], start: usize, size: usize) -> String {
    lines[start..(start + size).min(lines.len())].join("\n")
}

fn cookie_flags(file: &SourceFile) -> Vec<RuleHit> {
    let lines: Vec<&str> = file.content.lines().collect();
    let mut hits = Vec::new();
    for (idx, line) in lines.iter().enumerate() {
        if is_comment_line(line) || !re_cookie_call().is_match(line) {
            continue;
        }
        let call = window(&lines, idx, 6);
        let missing: Vec<&str> = ["httpOnly", "secure", "sameSite"]
            .into_iter()
            .filter(|flag| !call.contains(flag))
            .collect();
        if !missing.is_empty() {
            hits.push(RuleHit::at(
                Severity::Medium,
                "A05",
                idx + 1,
                format!("Cookie set without {}", missing.join(", ")),
            ));
        }
    }
    hits
}

fn upload_limits(file: &SourceFile) -> Vec<RuleHit> {
    let lines: Vec<&str> = file.content.lines().collect();
    let mut hits = Vec::new();
    for (idx, line) in lines.iter().enumerate() {
        if is_comment_line(line) || !re_upload_middleware().is_match(line) {
            continue;
        }
        let call = window(&lines, idx, 10);
        if !call.contains("fileFilter") {
            hits.push(RuleHit::at(
                Severity::High,
                "A04",
                idx + 1,
                "Upload middleware accepts any file type (no fileFilter)",
            ));
        }
        if !call.contains("limits") {
            hits.push(RuleHit::at(
                Severity::Medium,
                "A04",
                idx + 1,
                "Upload middleware has no size limits",
            ));
        }
    }
    hits
}

fn unauthenticated_routes(file: &SourceFile) -> Vec<RuleHit> {
    let in_routes = file.rel_path.split('/').any(|seg| seg == "routes");
    if !in_routes || re_auth_marker().is_match(&file.content) {
        return vec![];
    }
    file.numbered_lines()
        .filter(|(_, line)| !is_comment_line(line) && re_mutating_route().is_match(line))
        .map(|(no, line)| {
            RuleHit::at(
                Severity::High,
                "A01",
                no,
                format!("Mutating route without auth middleware (`{}`)", line.trim()),
            )
        })
        .collect()
}

fn pattern(
    id: &'static str,
    description: &'static str,
    category: &'static str,
    severity: Severity,
    re: &'static Regex,
) -> Box<dyn Rule> {
    Box::new(PatternRule {
        id,
        description,
        category,
        severity,
        pattern: re,
    })
}

/// Rules applied to every non-test source file.
pub fn file_rules() -> Vec<Box<dyn Rule>> {
    vec![
        pattern(
            "hardcoded-secret",
            "Hard-coded secret",
            "A07",
            Severity::Critical,
            re_hardcoded_secret(),
        ),
        pattern(
            "key-material",
            "Credential material in source",
            "A02",
            Severity::Critical,
            re_key_material(),
        ),
        pattern(
            "weak-hash",
            "Weak hash function",
            "A02",
            Severity::High,
            re_weak_hash(),
        ),
        pattern(
            "symmetric-jwt",
            "Symmetric token-signing algorithm",
            "A02",
            Severity::Medium,
            re_symmetric_jwt(),
        ),
        pattern(
            "jwt-literal-secret",
            "Literal secret passed to jwt.sign",
            "A07",
            Severity::Critical,
            re_jwt_literal_secret(),
        ),
        pattern(
            "sql-concat",
            "SQL built by string concatenation",
            "A03",
            Severity::Critical,
            re_sql_concat(),
        ),
        pattern(
            "shell-exec",
            "Dynamic code or shell execution",
            "A03",
            Severity::High,
            re_shell_exec(),
        ),
        pattern(
            "dom-sink",
            "DOM injection sink",
            "A03",
            Severity::High,
            re_dom_sink(),
        ),
        pattern(
            "wildcard-cors",
            "Wildcard CORS origin",
            "A05",
            Severity::High,
            re_wildcard_cors(),
        ),
        pattern(
            "empty-catch",
            "Empty catch block swallows errors",
            "A09",
            Severity::Medium,
            re_empty_catch(),
        ),
        pattern(
            "logged-credential",
            "Credential-looking value written to logs",
            "A09",
            Severity::High,
            re_logged_credential(),
        ),
        Box::new(FnRule {
            id: "cookie-flags",
            description: "Cookies must set httpOnly, secure and sameSite",
            check: cookie_flags,
        }),
        Box::new(FnRule {
            id: "upload-limits",
            description: "Upload middleware must filter types and limit size",
            check: upload_limits,
        }),
        Box::new(FnRule {
            id: "route-auth",
            description: "Mutating routes need auth middleware",
            check: unauthenticated_routes,
        }),
    ]
}

/// Rules that only make sense for code running on the server.
pub fn server_rules() -> Vec<Box<dyn Rule>> {
    vec![pattern(
        "ssrf",
        "Outbound request URL built from request input",
        "A10",
        Severity::High,
        re_ssrf(),
    )]
}

fn is_flexible_version(version: &str) -> bool {
    let v = version.trim();
    v == "*" || v == "latest" || v == "x" || v == "" || v.starts_with("x.") || v.ends_with(".x")
}

#[async_trait]
impl Validator for SecurityValidator {
    fn name(&self) -> &'static str {
        "security"
    }

    fn description(&self) -> &'static str {
        "OWASP-style security posture (A01-A10) with per-category scores"
    }

    async fn validate(
        &self,
        ctx: &ProjectContext,
        sink: &mut FindingSink,
    ) -> Result<PassSummary, WardenError> {
        let config = &ctx.config;
        let files = ctx.corpus.scan(&ScanFilter::sources(config)).await?;
        let file_rules = file_rules();
        let server_rules = server_rules();

        let mut server_entry: Option<&SourceFile> = None;
        let mut has_helmet = false;
        let mut has_rate_limit = false;

        for file in files.iter().filter(|f| !f.is_test() && !f.is_declaration()) {
            apply_rules(&file_rules, file, sink);
            if !is_server_file(config, file) {
                continue;
            }
            apply_rules(&server_rules, file, sink);
            if server_entry.is_none() && re_server_bootstrap().is_match(&file.content) {
                server_entry = Some(file);
            }
            has_helmet |= file.content.contains("helmet");
            has_rate_limit |= re_rate_limit().is_match(&file.content);
        }

        if let Some(server) = server_entry {
            if !has_helmet {
                sink.emit(
                    Severity::Medium,
                    "A05",
                    Location::file(server.rel_path.clone()),
                    "HTTP server without helmet security headers",
                );
            }
            if !has_rate_limit {
                sink.emit(
                    Severity::Medium,
                    "A04",
                    Location::file(server.rel_path.clone()),
                    "HTTP server without rate limiting",
                );
            }
        }

        // Supply chain
        if let Some(content) = ctx.corpus.read_optional(MANIFEST_FILE).await? {
            let manifest = PackageManifest::parse(&content)?;
            for (name, version) in manifest.all_dependencies() {
                if is_flexible_version(version) {
                    sink.emit(
                        Severity::Medium,
                        "A06",
                        Location::file(MANIFEST_FILE),
                        format!("Dependency '{}' uses unpinned version '{}'", name, version),
                    );
                }
            }
            if !LOCKFILES.iter().any(|l| ctx.corpus.exists(l)) {
                sink.emit(
                    Severity::Low,
                    "A06",
                    Location::file(MANIFEST_FILE),
                    "No lockfile committed",
                );
            }
        }

        // Subresource integrity
        let pages = ctx
            .corpus
            .scan(&ScanFilter::everywhere(&["html", "htm"]))
            .await?;
        for page in &pages {
            for m in re_external_script().find_iter(&page.content) {
                if !m.as_str().to_lowercase().contains("integrity") {
                    sink.emit(
                        Severity::Medium,
                        "A08",
                        Location::line(page.rel_path.clone(), line_of(&page.content, m.start())),
                        "External script without integrity attribute",
                    );
                }
            }
        }

        let scores: Vec<CategoryScore> = CATEGORIES
            .iter()
            .map(|(code, _)| {
                CategoryScore::from_findings(*code, sink.in_category(code), BUCKET_FACTOR)
            })
            .collect();
        let overall = mean(
            &scores
                .iter()
                .map(|c| c.normalized_score)
                .collect::<Vec<_>>(),
        );
        let card = ScoreCard::new(scores, overall);

        let summary = PassSummary::empty()
            .with_metric("files", files.len() as f64)
            .scored(&card);
        Ok(if card.overall < PASS_MARK {
            summary.failing()
        } else {
            summary
        })
    }
}
