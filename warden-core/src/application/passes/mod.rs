// warden-core/src/application/passes/mod.rs

pub mod api_routes;
pub mod architecture;
pub mod autofix;
pub mod build_output;
pub mod complexity;
pub mod debug_output;
pub mod dependencies;
pub mod duplicates;
pub mod env_consistency;
pub mod html_references;
pub mod naming;
pub mod orphans;
pub mod performance;
pub mod security;
pub mod testing;
pub mod type_safety;

use crate::domain::project::ProjectConfig;
use crate::domain::source::SourceFile;
use crate::domain::text::static_regex;
use crate::ports::validator::Validator;
use regex::Regex;
use std::sync::OnceLock;

/// Scored passes fail outright below this overall score.
pub const PASS_MARK: f64 = 50.0;

/// Every pass, in report order.
pub fn registry() -> Vec<Box<dyn Validator>> {
    vec![
        Box::new(architecture::ArchitectureValidator),
        Box::new(type_safety::TypeSafetyValidator),
        Box::new(security::SecurityValidator),
        Box::new(performance::PerformanceValidator),
        Box::new(testing::TestingValidator),
        Box::new(naming::NamingValidator),
        Box::new(complexity::ComplexityValidator),
        Box::new(duplicates::DuplicatesValidator),
        Box::new(debug_output::DebugOutputValidator),
        Box::new(orphans::OrphansValidator),
        Box::new(env_consistency::EnvConsistencyValidator),
        Box::new(dependencies::DependenciesValidator),
        Box::new(build_output::BuildOutputValidator),
        Box::new(html_references::HtmlReferencesValidator),
        Box::new(api_routes::ApiRoutesValidator),
        Box::new(autofix::AutofixValidator),
    ]
}

pub(crate) fn re_server_bootstrap() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r"\bexpress\s*\(\s*\)|\bfastify\s*\(|\bcreateServer\s*\(")
}

/// Code that runs on the server: anything outside the presentation layer.
pub(crate) fn is_server_file(config: &ProjectConfig, file: &SourceFile) -> bool {
    !config.is_presentation(&file.rel_path) && !file.is_markup()
}

/// First server-side file that boots an HTTP server.
pub(crate) fn find_server<'a>(
    config: &ProjectConfig,
    files: &'a [SourceFile],
) -> Option<&'a SourceFile> {
    files
        .iter()
        .filter(|f| !f.is_test() && is_server_file(config, f))
        .find(|f| re_server_bootstrap().is_match(&f.content))
}
