// warden-core/src/domain/report.rs

use crate::domain::finding::Finding;
use crate::domain::scoring::Grade;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Result of one pass: `{hasErrors, details[], metrics?, score?, grade?}` plus the
/// raw findings behind the details.
#[derive(Debug, Clone, Serialize)]
pub struct PassOutcome {
    pub name: String,
    pub description: String,
    pub has_errors: bool,
    pub findings: Vec<Finding>,
    pub details: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metrics: BTreeMap<String, f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<Grade>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub timestamp: DateTime<Utc>,
    pub outcomes: Vec<PassOutcome>,
}

impl ValidationReport {
    pub fn validators_run(&self) -> usize {
        self.outcomes.len()
    }

    pub fn validators_failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.has_errors).count()
    }

    pub fn validators_passed(&self) -> usize {
        self.validators_run() - self.validators_failed()
    }

    pub fn failing(&self) -> impl Iterator<Item = &PassOutcome> {
        self.outcomes.iter().filter(|o| o.has_errors)
    }

    pub fn is_clean(&self) -> bool {
        self.validators_failed() == 0
    }

    pub fn total_findings(&self) -> usize {
        self.outcomes.iter().map(|o| o.findings.len()).sum()
    }

    pub fn outcome(&self, name: &str) -> Option<&PassOutcome> {
        self.outcomes.iter().find(|o| o.name == name)
    }
}
