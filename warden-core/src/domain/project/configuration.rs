// src/domain/project/configuration.rs

use crate::domain::error::DomainError;
use crate::domain::finding::Severity;
use crate::domain::source::is_under;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::{Validate, ValidationError};

pub const PRESENTATION_LAYER: &str = "presentation";

/// A named architectural zone: which path prefixes belong to it and which
/// layers it may link to. Same-layer linkage is always allowed.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct LayerRule {
    pub prefixes: Vec<String>,
    #[serde(default)]
    pub allowed: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
#[serde(default)]
pub struct Thresholds {
    #[validate(range(min = 1, message = "complexity threshold must be positive"))]
    pub complexity: u32,
    #[validate(range(min = 1))]
    pub max_test_lines: usize,
    #[validate(range(min = 1))]
    pub max_bundle_file_kb: u64,
    #[validate(range(min = 1))]
    pub max_bundle_total_kb: u64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            complexity: 10,
            max_test_lines: 50,
            max_bundle_file_kb: 250,
            max_bundle_total_kb: 1024,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
#[serde(default)]
pub struct ProjectConfig {
    #[validate(length(min = 1, message = "report_path cannot be empty"))]
    pub report_path: String,

    #[validate(length(min = 1, message = "at least one source directory is required"))]
    pub source_dirs: Vec<String>,

    #[validate(length(min = 1, message = "at least one extension is required"))]
    pub extensions: Vec<String>,

    pub exclude_dirs: Vec<String>,

    /// Lowest severity that makes a pass fail.
    pub fail_on: Severity,

    /// Pass names to skip.
    pub disabled: Vec<String>,

    #[validate(custom(function = "validate_layer_table"))]
    pub layers: BTreeMap<String, LayerRule>,

    pub prohibited_dirs: Vec<String>,

    /// Basenames that may repeat across the tree; `name.*` matches any extension.
    pub allowed_duplicate_basenames: Vec<String>,

    pub entry_points: Vec<String>,

    /// Environment variables that need no declaration.
    pub implicit_env: Vec<String>,

    #[validate(length(min = 2))]
    pub default_extension: String,

    pub build_dir: String,

    /// Module (without extension) the logger rewrite imports from.
    pub logger_module: String,

    #[validate(nested)]
    pub thresholds: Thresholds,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            report_path: "VALIDATION_REPORT.md".to_string(),
            source_dirs: vec!["src".to_string(), "public".to_string()],
            extensions: ["ts", "tsx", "js", "jsx"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            exclude_dirs: ["node_modules", "dist", "build", "coverage", ".git"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            fail_on: Severity::Medium,
            disabled: vec![],
            layers: default_layers(),
            prohibited_dirs: ["temp", "tmp", "old", "backup", "misc", "legacy"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            allowed_duplicate_basenames: vec!["index.*".to_string()],
            entry_points: [
                "src/index.ts",
                "src/server.ts",
                "src/app.ts",
                "src/main.ts",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            implicit_env: vec!["NODE_ENV".to_string()],
            default_extension: ".ts".to_string(),
            build_dir: "dist".to_string(),
            logger_module: "src/utils/logger".to_string(),
            thresholds: Thresholds::default(),
        }
    }
}

fn layer(prefixes: &[&str], allowed: &[&str]) -> LayerRule {
    LayerRule {
        prefixes: prefixes.iter().map(|s| s.to_string()).collect(),
        allowed: allowed.iter().map(|s| s.to_string()).collect(),
    }
}

pub fn default_layers() -> BTreeMap<String, LayerRule> {
    let mut layers = BTreeMap::new();
    layers.insert(
        "routes".to_string(),
        layer(
            &["src/routes"],
            &["controllers", "middleware", "shared", "config"],
        ),
    );
    layers.insert(
        "controllers".to_string(),
        layer(&["src/controllers"], &["services", "shared", "config"]),
    );
    layers.insert(
        "middleware".to_string(),
        layer(&["src/middleware"], &["services", "shared", "config"]),
    );
    layers.insert(
        "services".to_string(),
        layer(&["src/services"], &["repositories", "shared", "config"]),
    );
    layers.insert(
        "repositories".to_string(),
        layer(&["src/repositories", "src/db"], &["shared", "config"]),
    );
    layers.insert(
        PRESENTATION_LAYER.to_string(),
        layer(&["src/frontend", "public"], &["shared"]),
    );
    layers.insert("config".to_string(), layer(&["src/config"], &["shared"]));
    layers.insert(
        "shared".to_string(),
        layer(&["src/types", "src/utils", "src/shared"], &[]),
    );
    layers
}

fn validate_layer_table(layers: &BTreeMap<String, LayerRule>) -> Result<(), ValidationError> {
    for (name, rule) in layers {
        if rule.prefixes.is_empty() {
            let mut err = ValidationError::new("layer_without_prefix");
            err.message = Some(format!("layer '{}' declares no path prefix", name).into());
            return Err(err);
        }
        if let Some(unknown) = rule.allowed.iter().find(|a| !layers.contains_key(*a)) {
            let mut err = ValidationError::new("unknown_layer");
            err.message =
                Some(format!("layer '{}' allows unknown layer '{}'", name, unknown).into());
            return Err(err);
        }
    }
    Ok(())
}

impl ProjectConfig {
    pub fn check(&self) -> Result<(), DomainError> {
        self.validate()
            .map_err(|e| DomainError::InvalidConfig(e.to_string()))
    }

    /// Layer with the longest matching prefix, if any.
    pub fn layer_of(&self, rel_path: &str) -> Option<&str> {
        self.layers
            .iter()
            .flat_map(|(name, rule)| rule.prefixes.iter().map(move |p| (name, p)))
            .filter(|(_, prefix)| is_under(rel_path, prefix))
            .max_by_key(|(_, prefix)| prefix.len())
            .map(|(name, _)| name.as_str())
    }

    pub fn may_depend(&self, from_layer: &str, to_layer: &str) -> bool {
        from_layer == to_layer
            || self
                .layers
                .get(from_layer)
                .is_some_and(|rule| rule.allowed.iter().any(|a| a == to_layer))
    }

    pub fn is_presentation(&self, rel_path: &str) -> bool {
        self.layer_of(rel_path) == Some(PRESENTATION_LAYER)
    }

    pub fn is_excluded_dir(&self, name: &str) -> bool {
        self.exclude_dirs.iter().any(|d| d == name)
    }

    pub fn is_enabled(&self, pass: &str) -> bool {
        !self.disabled.iter().any(|d| d == pass)
    }

    pub fn duplicate_allowed(&self, basename: &str) -> bool {
        self.allowed_duplicate_basenames.iter().any(|allowed| {
            match allowed.strip_suffix(".*") {
                Some(stem) => basename.split('.').next() == Some(stem),
                None => allowed == basename,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ProjectConfig::default().check().is_ok());
    }

    #[test]
    fn test_layer_of_prefers_longest_prefix() {
        let mut config = ProjectConfig::default();
        config.layers.insert(
            "admin".to_string(),
            layer(&["src/controllers/admin"], &["services"]),
        );
        assert_eq!(
            config.layer_of("src/controllers/order.controller.ts"),
            Some("controllers")
        );
        assert_eq!(
            config.layer_of("src/controllers/admin/users.ts"),
            Some("admin")
        );
        assert_eq!(config.layer_of("scripts/seed.ts"), None);
    }

    #[test]
    fn test_dependency_rules() {
        let config = ProjectConfig::default();
        assert!(config.may_depend("controllers", "services"));
        assert!(!config.may_depend("controllers", "routes"));
        assert!(config.may_depend("shared", "shared"));
    }

    #[test]
    fn test_unknown_allowed_layer_is_rejected() {
        let mut config = ProjectConfig::default();
        config
            .layers
            .insert("jobs".to_string(), layer(&["src/jobs"], &["queue"]));
        assert!(matches!(
            config.check(),
            Err(DomainError::InvalidConfig(msg)) if msg.contains("queue")
        ));
    }

    #[test]
    fn test_zero_threshold_is_rejected() {
        let mut config = ProjectConfig::default();
        config.thresholds.complexity = 0;
        assert!(config.check().is_err());
    }

    #[test]
    fn test_duplicate_allow_list() {
        let config = ProjectConfig::default();
        assert!(config.duplicate_allowed("index.ts"));
        assert!(config.duplicate_allowed("index.tsx"));
        assert!(!config.duplicate_allowed("order.ts"));
    }
}
