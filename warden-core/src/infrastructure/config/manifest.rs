// warden-core/src/infrastructure/config/manifest.rs

use crate::infrastructure::error::InfrastructureError;
use serde::Deserialize;
use std::collections::BTreeMap;

pub const MANIFEST_FILE: &str = "package.json";

pub const LOCKFILES: [&str; 4] = [
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "bun.lockb",
];

/// The parts of `package.json` the passes read. Everything else is ignored.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PackageManifest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    #[serde(default)]
    pub dev_dependencies: BTreeMap<String, String>,
    #[serde(default)]
    pub scripts: BTreeMap<String, String>,
}

impl PackageManifest {
    pub fn parse(content: &str) -> Result<Self, InfrastructureError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Runtime and dev dependencies together, runtime first.
    pub fn all_dependencies(&self) -> impl Iterator<Item = (&String, &String)> {
        self.dependencies.iter().chain(self.dev_dependencies.iter())
    }

    pub fn depends_on(&self, package: &str) -> bool {
        self.dependencies.contains_key(package) || self.dev_dependencies.contains_key(package)
    }

    pub fn script_mentions(&self, needle: &str) -> bool {
        self.scripts.values().any(|s| s.contains(needle))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reads_dependency_tables() {
        let manifest = PackageManifest::parse(
            r#"{
                "name": "shop",
                "dependencies": { "express": "^4.18.0", "helmet": "7.0.0" },
                "devDependencies": { "jest": "*" },
                "scripts": { "test": "jest --coverage" }
            }"#,
        )
        .unwrap();

        assert_eq!(manifest.name.as_deref(), Some("shop"));
        assert_eq!(manifest.dependencies.len(), 2);
        assert!(manifest.depends_on("jest"));
        assert!(manifest.script_mentions("--coverage"));
        assert_eq!(manifest.all_dependencies().count(), 3);
    }

    #[test]
    fn test_missing_tables_default_to_empty() {
        let manifest = PackageManifest::parse("{}").unwrap();
        assert!(manifest.dependencies.is_empty());
        assert!(manifest.scripts.is_empty());
    }

    #[test]
    fn test_malformed_manifest_is_an_error() {
        assert!(matches!(
            PackageManifest::parse("{ \"dependencies\": "),
            Err(InfrastructureError::JsonError(_))
        ));
    }
}
