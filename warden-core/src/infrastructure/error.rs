// warden-core/src/infrastructure/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum InfrastructureError {
    // --- FILESYSTEM (IO) ---
    #[error("File System Error: {0}")]
    #[diagnostic(
        code(warden::infra::io),
        help("Check file permissions or path validity.")
    )]
    Io(#[from] std::io::Error),

    #[error("Directory Walk Error: {0}")]
    #[diagnostic(
        code(warden::infra::walk),
        help("A directory under the project root could not be read.")
    )]
    Walk(#[from] walkdir::Error),

    // --- MANIFESTS / CONFIG ---
    #[error("JSON Parsing Error: {0}")]
    #[diagnostic(
        code(warden::infra::json),
        help("Check package.json / tsconfig.json syntax.")
    )]
    JsonError(#[from] serde_json::Error),

    #[error("YAML Parsing Error: {0}")]
    #[diagnostic(
        code(warden::infra::yaml),
        help("Check your YAML syntax (indentation, types).")
    )]
    YamlError(#[from] serde_yaml::Error),

    #[error("Configuration Error: {0}")]
    ConfigError(String),

    #[error("{0:#}")]
    #[diagnostic(code(warden::infra::context))]
    Context(#[from] anyhow::Error),

    #[error("Required file not found: '{0}'")]
    #[diagnostic(code(warden::infra::missing_file))]
    MissingFile(String),
}
