// warden-core/src/infrastructure/config/pipelines.rs

use crate::error::WardenError;
use crate::infrastructure::error::InfrastructureError;
use crate::ports::corpus::CorpusSource;
use serde_yaml::Value;
use tracing::debug;

pub const WORKFLOW_DIR: &str = ".github/workflows";

pub const PIPELINE_FILES: [&str; 3] = [
    ".gitlab-ci.yml",
    "azure-pipelines.yml",
    ".circleci/config.yml",
];

/// One CI pipeline definition, parsed eagerly.
#[derive(Debug, Clone)]
pub struct Pipeline {
    pub path: String,
    pub document: Value,
}

impl Pipeline {
    pub fn parse(path: impl Into<String>, content: &str) -> Result<Self, InfrastructureError> {
        Ok(Self {
            path: path.into(),
            document: serde_yaml::from_str(content)?,
        })
    }

    /// Case-insensitive search through every key and string value.
    pub fn mentions(&self, needles: &[&str]) -> bool {
        let needles: Vec<String> = needles.iter().map(|n| n.to_lowercase()).collect();
        let mut found = false;
        visit_strings(&self.document, &mut |s| {
            let lower = s.to_lowercase();
            if needles.iter().any(|n| lower.contains(n.as_str())) {
                found = true;
            }
        });
        found
    }
}

fn visit_strings(value: &Value, visit: &mut dyn FnMut(&str)) {
    match value {
        Value::String(s) => visit(s),
        Value::Sequence(items) => items.iter().for_each(|v| visit_strings(v, visit)),
        Value::Mapping(map) => {
            for (k, v) in map {
                visit_strings(k, visit);
                visit_strings(v, visit);
            }
        }
        Value::Tagged(tagged) => visit_strings(&tagged.value, visit),
        _ => {}
    }
}

/// Every pipeline definition in the project. A malformed file is an error.
pub async fn load_pipelines(corpus: &dyn CorpusSource) -> Result<Vec<Pipeline>, WardenError> {
    let mut paths: Vec<String> = corpus
        .list(WORKFLOW_DIR, &["yml", "yaml"])
        .await?
        .into_iter()
        .map(|(rel, _)| rel)
        .collect();
    paths.extend(PIPELINE_FILES.iter().map(|p| p.to_string()));

    let mut pipelines = Vec::new();
    for path in paths {
        match corpus.read_optional(&path).await? {
            Some(content) => pipelines.push(Pipeline::parse(path, &content)?),
            None => debug!(file = %path, "No pipeline definition"),
        }
    }
    Ok(pipelines)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const WORKFLOW: &str = r#"
name: CI
on: [push]
jobs:
  build:
    runs-on: ubuntu-latest
    steps:
      - uses: actions/checkout@v4
      - run: npm ci
      - run: npm test -- --coverage
"#;

    #[test]
    fn test_mentions_searches_nested_values() {
        let pipeline = Pipeline::parse(".github/workflows/ci.yml", WORKFLOW).unwrap();
        assert!(pipeline.mentions(&["npm test", "jest"]));
        assert!(pipeline.mentions(&["COVERAGE"]));
        assert!(!pipeline.mentions(&["lighthouse"]));
    }

    #[test]
    fn test_invalid_yaml_is_rejected() {
        assert!(Pipeline::parse("ci.yml", "jobs: [unclosed").is_err());
    }
}
