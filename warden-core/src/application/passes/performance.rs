// warden-core/src/application/passes/performance.rs
//
// Web-vitals style posture. Loading speed is split into five fine-grained
// sub-scores (LCP, FID, CLS, FCP, TTFB) scored with the steeper factor and
// averaged; the other buckets are scored directly. CPU-heavy work is filed
// under FID on the client and under backend on the server.

use crate::application::passes::{PASS_MARK, find_server, is_server_file};
use crate::domain::finding::{FindingSink, Location, Severity};
use crate::domain::scoring::{
    BUCKET_FACTOR, CategoryScore, SUB_SCORE_FACTOR, ScoreCard, blend, mean, raw_score,
};
use crate::domain::source::SourceFile;
use crate::domain::text::{block_end, is_comment_line, line_of, static_regex};
use crate::error::WardenError;
use crate::ports::corpus::ScanFilter;
use crate::ports::validator::{PassSummary, ProjectContext, Validator};
use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;

pub const LOADING_METRICS: [&str; 5] = ["LCP", "FID", "CLS", "FCP", "TTFB"];

/// `(bucket, weight)` of the overall blend. `loading` is the mean of the sub-scores.
pub const BUCKET_WEIGHTS: [(&str, f64); 6] = [
    ("loading", 25.0),
    ("memory", 15.0),
    ("network", 15.0),
    ("database", 15.0),
    ("frontend", 15.0),
    ("backend", 15.0),
];

pub struct PerformanceValidator;

fn re_img_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r"(?i)<img\b[^>]*>")
}

fn re_script_src() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r"(?i)<script\b[^>]*\bsrc\s*=[^>]*>")
}

fn re_click_handler() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(
        &RE,
        r#"addEventListener\(\s*['"]click['"]|\bonClick\s*=|\.onclick\s*="#,
    )
}

fn re_heavy_work() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(
        &RE,
        r"\b(for|while)\s*\(|\.sort\(|JSON\.(parse|stringify)\(|\.forEach\(|localStorage\.",
    )
}

fn re_module_collection() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(
        &RE,
        r"^(?:export\s+)?(?:const|let|var)\s+([A-Za-z_$][\w$]*)\s*(?::[^=]+)?=\s*(?:\[\s*\]|new\s+(?:Map|Set)\b|\{\s*\})",
    )
}

fn re_loop_start() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(
        &RE,
        r"\bfor\s*\(|\bwhile\s*\(|\.forEach\(|\.map\(\s*async\b",
    )
}

fn re_query_call() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(
        &RE,
        r"\bawait\s+[\w.$]*\.(from|query|find\w*|select|insert|update|delete|upsert|rpc)\s*\(",
    )
}

fn re_select_star() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r#"\.select\(\s*['"]\*['"]\s*\)"#)
}

fn re_blocking_call() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(
        &RE,
        r"\b(readFileSync|writeFileSync|execSync|pbkdf2Sync|scryptSync)\s*\(",
    )
}

fn re_cache_setup() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r"(?i)cache-control|cacheControl|maxAge|\betag\b")
}

fn re_security_headers() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r"\bhelmet\b|\.setHeader\s*\(|\.set\s*\(\s*['\x22]X-")
}

// --- MARKUP ---

fn check_images(page: &SourceFile, sink: &mut FindingSink) {
    for m in re_img_tag().find_iter(&page.content) {
        let tag = m.as_str().to_lowercase();
        let line = line_of(&page.content, m.start());
        if !tag.contains("loading=") {
            sink.emit(
                Severity::Medium,
                "LCP",
                Location::line(page.rel_path.clone(), line),
                "Image without loading attribute",
            );
        }
        if !(tag.contains("width") && tag.contains("height")) {
            sink.emit(
                Severity::Low,
                "CLS",
                Location::line(page.rel_path.clone(), line),
                "Image without explicit width and height",
            );
        }
    }
}

fn check_blocking_scripts(page: &SourceFile, sink: &mut FindingSink) {
    for m in re_script_src().find_iter(&page.content) {
        let tag = m.as_str().to_lowercase();
        let deferred = tag.contains("defer")
            || tag.contains("async")
            || tag.contains(r#"type="module""#)
            || tag.contains("type='module'");
        if !deferred {
            sink.emit(
                Severity::Medium,
                "FCP",
                Location::line(page.rel_path.clone(), line_of(&page.content, m.start())),
                "Render-blocking script (no defer/async/module)",
            );
        }
    }
}

fn check_css_imports(sheet: &SourceFile, sink: &mut FindingSink) {
    for (no, line) in sheet.numbered_lines() {
        if line.trim_start().starts_with("@import") {
            sink.emit(
                Severity::Low,
                "FCP",
                Location::line(sheet.rel_path.clone(), no),
                "CSS @import delays first paint",
            );
        }
    }
}

// --- SCRIPTS ---

fn check_click_handlers(file: &SourceFile, sink: &mut FindingSink) {
    let lines: Vec<&str> = file.content.lines().collect();
    for (idx, line) in lines.iter().enumerate() {
        if is_comment_line(line) || !re_click_handler().is_match(line) {
            continue;
        }
        let end = block_end(&lines, idx).unwrap_or(idx);
        let heavy = lines[idx..=end]
            .iter()
            .any(|l| !is_comment_line(l) && re_heavy_work().is_match(l));
        if heavy {
            sink.emit(
                Severity::Medium,
                "FID",
                Location::line(file.rel_path.clone(), idx + 1),
                "Heavy synchronous work inside a click handler",
            );
        }
    }
}

fn check_memory(file: &SourceFile, sink: &mut FindingSink) {
    let content = &file.content;

    for (no, line) in file.numbered_lines() {
        let Some(caps) = re_module_collection().captures(line) else {
            continue;
        };
        let name = regex::escape(&caps[1]);
        let grows = Regex::new(&format!(r"\b{}\.(push|set|add|unshift)\s*\(", name));
        let shrinks = Regex::new(&format!(
            r"\b{}\.(splice|shift|pop|delete|clear)\s*\(|\b{}\.length\s*=\s*0|\b{}\s*=[^=>]",
            name, name, name
        ));
        let (Ok(grows), Ok(shrinks)) = (grows, shrinks) else {
            continue;
        };
        // The declaration itself matches the reassignment arm
        let rest = &content[content
            .lines()
            .take(no)
            .map(|l| l.len() + 1)
            .sum::<usize>()
            .min(content.len())..];
        if grows.is_match(rest) && !shrinks.is_match(rest) {
            sink.emit(
                Severity::Medium,
                "memory",
                Location::line(file.rel_path.clone(), no),
                format!("Module-level collection '{}' only ever grows", &caps[1]),
            );
        }
    }

    if !content.contains("clearInterval") {
        for (no, line) in file.numbered_lines() {
            if !is_comment_line(line) && line.contains("setInterval(") {
                sink.emit(
                    Severity::Medium,
                    "memory",
                    Location::line(file.rel_path.clone(), no),
                    "setInterval without clearInterval",
                );
            }
        }
    }

    if !content.contains("removeEventListener") {
        let first = file
            .numbered_lines()
            .find(|(_, l)| !is_comment_line(l) && l.contains("addEventListener("));
        if let Some((no, _)) = first {
            sink.emit(
                Severity::Low,
                "memory",
                Location::line(file.rel_path.clone(), no),
                "Event listeners are added but never removed",
            );
        }
    }
}

fn check_queries(file: &SourceFile, sink: &mut FindingSink) {
    let lines: Vec<&str> = file.content.lines().collect();
    let mut idx = 0;
    while idx < lines.len() {
        let line = lines[idx];
        if is_comment_line(line) || !re_loop_start().is_match(line) {
            idx += 1;
            continue;
        }
        let Some(end) = block_end(&lines, idx) else {
            idx += 1;
            continue;
        };
        let query = lines[idx..=end]
            .iter()
            .position(|l| !is_comment_line(l) && re_query_call().is_match(l));
        if let Some(offset) = query {
            sink.emit(
                Severity::High,
                "database",
                Location::line(file.rel_path.clone(), idx + offset + 1),
                "Query inside a loop (N+1)",
            );
            // One finding per loop, nested loops included
            idx = end + 1;
        } else {
            idx += 1;
        }
    }

    for (no, line) in file.numbered_lines() {
        if !is_comment_line(line) && re_select_star().is_match(line) {
            sink.emit(
                Severity::Low,
                "database",
                Location::line(file.rel_path.clone(), no),
                "select('*') fetches every column",
            );
        }
    }
}

fn check_blocking_calls(file: &SourceFile, sink: &mut FindingSink) {
    for (no, line) in file.numbered_lines() {
        if is_comment_line(line) {
            continue;
        }
        if let Some(caps) = re_blocking_call().captures(line) {
            sink.emit(
                Severity::Medium,
                "backend",
                Location::line(file.rel_path.clone(), no),
                format!("Synchronous blocking call `{}` in server code", &caps[1]),
            );
        }
    }
}

fn score_card(sink: &FindingSink) -> ScoreCard {
    let mut categories = Vec::new();

    let vitals: Vec<CategoryScore> = LOADING_METRICS
        .iter()
        .map(|m| CategoryScore::from_findings(*m, sink.in_category(m), SUB_SCORE_FACTOR))
        .collect();
    let loading = mean(
        &vitals
            .iter()
            .map(|v| v.normalized_score)
            .collect::<Vec<_>>(),
    );
    let loading_raw: f64 = vitals.iter().map(|v| v.raw_score).sum();
    categories.extend(vitals);
    categories.push(CategoryScore::from_score("loading", loading_raw, loading));

    let mut parts = vec![(loading, BUCKET_WEIGHTS[0].1)];
    for (bucket, weight) in BUCKET_WEIGHTS.iter().skip(1) {
        let score = CategoryScore::from_findings(*bucket, sink.in_category(bucket), BUCKET_FACTOR);
        parts.push((score.normalized_score, *weight));
        categories.push(score);
    }

    ScoreCard::new(categories, blend(&parts))
}

#[async_trait]
impl Validator for PerformanceValidator {
    fn name(&self) -> &'static str {
        "performance"
    }

    fn description(&self) -> &'static str {
        "Loading speed (LCP, FID, CLS, FCP, TTFB), memory, network, database, frontend and backend"
    }

    async fn validate(
        &self,
        ctx: &ProjectContext,
        sink: &mut FindingSink,
    ) -> Result<PassSummary, WardenError> {
        let config = &ctx.config;
        let files = ctx.corpus.scan(&ScanFilter::sources(config)).await?;
        let pages = ctx
            .corpus
            .scan(&ScanFilter::everywhere(&["html", "htm"]))
            .await?;
        let sheets = ctx.corpus.scan(&ScanFilter::everywhere(&["css"])).await?;

        // 1. Loading speed
        for page in &pages {
            check_images(page, sink);
            check_blocking_scripts(page, sink);
        }
        for file in files.iter().filter(|f| f.is_markup()) {
            check_images(file, sink);
        }
        for sheet in &sheets {
            check_css_imports(sheet, sink);
        }

        // 2. Per-script buckets
        for file in files.iter().filter(|f| !f.is_test() && !f.is_declaration()) {
            check_memory(file, sink);
            if is_server_file(config, file) {
                check_queries(file, sink);
                check_blocking_calls(file, sink);
            } else {
                check_click_handlers(file, sink);
            }
        }

        // 3. Server setup
        if let Some(server) = find_server(config, &files) {
            let server_code: Vec<&SourceFile> = files
                .iter()
                .filter(|f| is_server_file(config, f) && !f.is_test())
                .collect();
            let any = |re: &Regex| server_code.iter().any(|f| re.is_match(&f.content));
            let location = || Location::file(server.rel_path.clone());

            if !any(re_cache_setup()) {
                sink.emit(
                    Severity::Low,
                    "TTFB",
                    location(),
                    "No Cache-Control setup on the HTTP server",
                );
            }
            if !server_code.iter().any(|f| f.content.contains("compression")) {
                sink.emit(
                    Severity::Medium,
                    "network",
                    location(),
                    "HTTP server without response compression",
                );
            }
            if !any(re_security_headers()) {
                sink.emit(
                    Severity::Low,
                    "network",
                    location(),
                    "HTTP server without security header setup",
                );
            }
        }

        // 4. Bundle sizes
        let bundle = ctx
            .corpus
            .list(&config.build_dir, &["js", "mjs", "css"])
            .await?;
        let file_limit = config.thresholds.max_bundle_file_kb * 1024;
        let total_limit = config.thresholds.max_bundle_total_kb * 1024;
        let mut total = 0;
        for (rel, size) in &bundle {
            total += size;
            if *size > file_limit {
                sink.emit(
                    Severity::Medium,
                    "frontend",
                    Location::file(rel.clone()),
                    format!(
                        "Bundle file is {} KiB (limit {} KiB)",
                        size / 1024,
                        config.thresholds.max_bundle_file_kb
                    ),
                );
            }
        }
        if total > total_limit {
            sink.emit(
                Severity::High,
                "frontend",
                Location::file(config.build_dir.clone()),
                format!(
                    "Build output totals {} KiB (limit {} KiB)",
                    total / 1024,
                    config.thresholds.max_bundle_total_kb
                ),
            );
        }

        Ok(summarize(sink).with_metric("bundle_kb", (total / 1024) as f64))
    }
}

/// Scores the findings. Below the pass mark the pass fails whatever their severities.
fn summarize(sink: &FindingSink) -> PassSummary {
    let card = score_card(sink);
    let summary = PassSummary::empty()
        .with_metric("raw", raw_score(sink.findings()))
        .scored(&card);
    if card.overall < PASS_MARK {
        summary.failing()
    } else {
        summary
    }
}
