// warden-core/src/ports/validator.rs

// The contract every analysis pass implements. The orchestrator only knows
// this trait: it builds the context once, hands each pass its own sink and
// turns the returned summary into a report outcome.

use crate::domain::finding::FindingSink;
use crate::domain::project::ProjectConfig;
use crate::domain::scoring::{Grade, ScoreCard};
use crate::error::WardenError;
use crate::ports::corpus::CorpusSource;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Everything a pass may read. Shared, read-only, built once per run.
#[derive(Clone)]
pub struct ProjectContext {
    pub root: PathBuf,
    pub config: Arc<ProjectConfig>,
    pub corpus: Arc<dyn CorpusSource>,
}

impl ProjectContext {
    pub fn new(
        root: impl Into<PathBuf>,
        config: Arc<ProjectConfig>,
        corpus: Arc<dyn CorpusSource>,
    ) -> Self {
        Self {
            root: root.into(),
            config,
            corpus,
        }
    }
}

/// What a pass returns besides its findings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PassSummary {
    pub metrics: BTreeMap<String, f64>,
    pub score: Option<f64>,
    pub grade: Option<Grade>,
    /// Forces the pass to fail regardless of finding severities.
    pub failed: bool,
}

impl PassSummary {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_metric(mut self, key: impl Into<String>, value: f64) -> Self {
        self.metrics.insert(key.into(), value);
        self
    }

    /// Copies the overall score, the grade and every category score into the summary.
    pub fn scored(mut self, card: &ScoreCard) -> Self {
        self.metrics.extend(card.metrics());
        self.score = Some(card.overall);
        self.grade = Some(card.grade);
        self
    }

    pub fn failing(mut self) -> Self {
        self.failed = true;
        self
    }
}

#[async_trait]
pub trait Validator: Send + Sync {
    /// Stable identifier, used in reports and in the `disabled` config list.
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    async fn validate(
        &self,
        ctx: &ProjectContext,
        sink: &mut FindingSink,
    ) -> Result<PassSummary, WardenError>;
}
