// warden-core/src/domain/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DomainError {
    #[error("Invalid configuration: {0}")]
    #[diagnostic(
        code(warden::domain::config),
        help("Check warden.yaml (layers, thresholds, fail_on) against the documented fields.")
    )]
    InvalidConfig(String),

    #[error("Unknown validator '{0}'")]
    #[diagnostic(
        code(warden::domain::unknown_validator),
        help("Run `warden list` to see the registered validators.")
    )]
    UnknownValidator(String),

    #[error("Remediation plan is stale: '{0}' changed since it was analysed")]
    #[diagnostic(
        code(warden::domain::stale_plan),
        help("Re-run `warden fix` so the plan is computed from the current file contents.")
    )]
    StalePlan(String),
}
