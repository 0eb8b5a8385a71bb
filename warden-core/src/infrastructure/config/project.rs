// warden-core/src/infrastructure/config/project.rs

use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

use crate::domain::finding::Severity;
use crate::domain::project::configuration::ProjectConfig;
use crate::error::WardenError;
use crate::infrastructure::error::InfrastructureError;

pub const CONFIG_CANDIDATES: [&str; 2] = ["warden.yaml", ".warden.yaml"];

pub const ENV_REPORT_PATH: &str = "WARDEN_REPORT_PATH";
pub const ENV_FAIL_ON: &str = "WARDEN_FAIL_ON";

/// Loads `warden.yaml` (or the explicit `config_file`), applies environment
/// overrides and validates the result. No file at all means defaults.
#[instrument(skip(project_dir))]
pub fn load_project_config(
    project_dir: &Path,
    config_file: Option<&Path>,
) -> Result<ProjectConfig, WardenError> {
    load_project_config_with(project_dir, config_file, |key| std::env::var(key).ok())
}

/// Same as [`load_project_config`] with an injectable environment lookup.
pub fn load_project_config_with<F>(
    project_dir: &Path,
    config_file: Option<&Path>,
    env: F,
) -> Result<ProjectConfig, WardenError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match find_main_config(project_dir, config_file)? {
        Some(config_path) => {
            info!(path = ?config_path, "Loading project configuration");
            let content = fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config at {:?}", config_path))
                .map_err(InfrastructureError::from)?;
            parse_config(&content)
                .with_context(|| format!("Failed to parse config YAML at {:?}", config_path))
                .map_err(InfrastructureError::from)?
        }
        None => {
            debug!(dir = ?project_dir, "No configuration file, using defaults");
            ProjectConfig::default()
        }
    };

    apply_env_overrides(&mut config, env)?;
    config.check()?;
    Ok(config)
}

fn parse_config(content: &str) -> Result<ProjectConfig, serde_yaml::Error> {
    // An empty file is a valid "all defaults" configuration
    if content.trim().is_empty() {
        return Ok(ProjectConfig::default());
    }
    serde_yaml::from_str(content)
}

fn find_main_config(
    root: &Path,
    explicit: Option<&Path>,
) -> Result<Option<PathBuf>, InfrastructureError> {
    if let Some(path) = explicit {
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            root.join(path)
        };
        if !path.exists() {
            return Err(InfrastructureError::MissingFile(
                path.display().to_string(),
            ));
        }
        return Ok(Some(path));
    }
    Ok(CONFIG_CANDIDATES
        .iter()
        .map(|name| root.join(name))
        .find(|p| p.exists()))
}

fn apply_env_overrides<F>(config: &mut ProjectConfig, env: F) -> Result<(), InfrastructureError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = env(ENV_REPORT_PATH) {
        info!(old = ?config.report_path, new = ?val, "Overriding report path via ENV");
        config.report_path = val;
    }
    if let Some(val) = env(ENV_FAIL_ON) {
        let severity: Severity = val.parse().map_err(|e: String| {
            InfrastructureError::ConfigError(format!("{}: {}", ENV_FAIL_ON, e))
        })?;
        info!(old = ?config.fail_on, new = ?severity, "Overriding failure threshold via ENV");
        config.fail_on = severity;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_missing_file_yields_defaults() -> Result<()> {
        let dir = tempdir()?;
        let config = load_project_config_with(dir.path(), None, no_env)?;
        assert_eq!(config.report_path, "VALIDATION_REPORT.md");
        assert_eq!(config.fail_on, Severity::Medium);
        Ok(())
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() -> Result<()> {
        let dir = tempdir()?;
        fs::write(
            dir.path().join("warden.yaml"),
            "fail_on: high\ndisabled: [autofix]\nthresholds:\n  complexity: 15\n",
        )?;
        let config = load_project_config_with(dir.path(), None, no_env)?;
        assert_eq!(config.fail_on, Severity::High);
        assert_eq!(config.disabled, vec!["autofix".to_string()]);
        assert_eq!(config.thresholds.complexity, 15);
        assert_eq!(config.thresholds.max_test_lines, 50);
        assert!(config.layers.contains_key("services"));
        Ok(())
    }

    #[test]
    fn test_env_overrides_win() -> Result<()> {
        let dir = tempdir()?;
        let env = |key: &str| match key {
            ENV_REPORT_PATH => Some("out/report.md".to_string()),
            ENV_FAIL_ON => Some("critical".to_string()),
            _ => None,
        };
        let config = load_project_config_with(dir.path(), None, env)?;
        assert_eq!(config.report_path, "out/report.md");
        assert_eq!(config.fail_on, Severity::Critical);
        Ok(())
    }

    #[test]
    fn test_bad_env_severity_is_rejected() -> Result<()> {
        let dir = tempdir()?;
        let env = |key: &str| (key == ENV_FAIL_ON).then(|| "blocker".to_string());
        let err = load_project_config_with(dir.path(), None, env).unwrap_err();
        assert!(err.to_string().contains("WARDEN_FAIL_ON"));
        Ok(())
    }

    #[test]
    fn test_malformed_yaml_is_an_error() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join(".warden.yaml"), "fail_on: [oops")?;
        assert!(load_project_config_with(dir.path(), None, no_env).is_err());
        Ok(())
    }

    #[test]
    fn test_explicit_missing_config_is_an_error() -> Result<()> {
        let dir = tempdir()?;
        let err =
            load_project_config_with(dir.path(), Some(Path::new("custom.yaml")), no_env)
                .unwrap_err();
        assert!(matches!(
            err,
            WardenError::Infrastructure(InfrastructureError::MissingFile(_))
        ));
        Ok(())
    }
}
