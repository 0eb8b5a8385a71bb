// warden-core/src/domain/scoring.rs
//
// Severity-weighted scoring shared by the security, performance and testing passes.
//
//   raw        = Σ weight(finding)
//   normalized = clamp(100 - raw * k, 0, 100)
//   k          = 10 for top-level buckets, 20 for fine-grained sub-scores

use crate::domain::finding::Finding;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const BUCKET_FACTOR: f64 = 10.0;
pub const SUB_SCORE_FACTOR: f64 = 20.0;

pub fn raw_score<'a, I>(findings: I) -> f64
where
    I: IntoIterator<Item = &'a Finding>,
{
    findings
        .into_iter()
        .map(|f| f64::from(f.severity.weight()))
        .sum()
}

pub fn normalize(raw: f64, factor: f64) -> f64 {
    (100.0 - raw * factor).clamp(0.0, 100.0)
}

/// Weighted average of `(score, weight)` pairs. An empty or zero-weight input scores 100.
pub fn blend(parts: &[(f64, f64)]) -> f64 {
    let total_weight: f64 = parts.iter().map(|(_, w)| w).sum();
    if total_weight <= 0.0 {
        return 100.0;
    }
    parts.iter().map(|(s, w)| s * w).sum::<f64>() / total_weight
}

pub fn mean(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        return 100.0;
    }
    scores.iter().sum::<f64>() / scores.len() as f64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "A-")]
    AMinus,
    #[serde(rename = "B+")]
    BPlus,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "B-")]
    BMinus,
    #[serde(rename = "C+")]
    CPlus,
    #[serde(rename = "C")]
    C,
    #[serde(rename = "C-")]
    CMinus,
    #[serde(rename = "D+")]
    DPlus,
    #[serde(rename = "D")]
    D,
    #[serde(rename = "F")]
    F,
}

impl Grade {
    /// 5-point bands from 90 (A+) down to 40 (D). Anything else, NaN included, is F.
    pub fn from_score(score: f64) -> Self {
        const BANDS: [(f64, Grade); 11] = [
            (90.0, Grade::APlus),
            (85.0, Grade::A),
            (80.0, Grade::AMinus),
            (75.0, Grade::BPlus),
            (70.0, Grade::B),
            (65.0, Grade::BMinus),
            (60.0, Grade::CPlus),
            (55.0, Grade::C),
            (50.0, Grade::CMinus),
            (45.0, Grade::DPlus),
            (40.0, Grade::D),
        ];
        BANDS
            .iter()
            .find(|(floor, _)| score >= *floor)
            .map(|(_, grade)| *grade)
            .unwrap_or(Grade::F)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::APlus => "A+",
            Self::A => "A",
            Self::AMinus => "A-",
            Self::BPlus => "B+",
            Self::B => "B",
            Self::BMinus => "B-",
            Self::CPlus => "C+",
            Self::C => "C",
            Self::CMinus => "C-",
            Self::DPlus => "D+",
            Self::D => "D",
            Self::F => "F",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryScore {
    pub category: String,
    pub raw_score: f64,
    pub normalized_score: f64,
    pub grade: Grade,
}

impl CategoryScore {
    pub fn from_findings<'a, I>(category: impl Into<String>, findings: I, factor: f64) -> Self
    where
        I: IntoIterator<Item = &'a Finding>,
    {
        let raw = raw_score(findings);
        Self::from_score(category, raw, normalize(raw, factor))
    }

    /// For scores that are not finding-derived (e.g. a coverage ratio).
    pub fn from_score(category: impl Into<String>, raw_score: f64, normalized: f64) -> Self {
        Self {
            category: category.into(),
            raw_score,
            normalized_score: normalized,
            grade: Grade::from_score(normalized),
        }
    }
}

/// Per-category scores plus the blended overall score of one pass.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreCard {
    pub categories: Vec<CategoryScore>,
    pub overall: f64,
    pub grade: Grade,
}

impl ScoreCard {
    pub fn new(categories: Vec<CategoryScore>, overall: f64) -> Self {
        Self {
            categories,
            overall,
            grade: Grade::from_score(overall),
        }
    }

    pub fn category(&self, name: &str) -> Option<&CategoryScore> {
        self.categories.iter().find(|c| c.category == name)
    }

    /// Flattens the card into `score.<category>` metrics.
    pub fn metrics(&self) -> BTreeMap<String, f64> {
        self.categories
            .iter()
            .map(|c| (format!("score.{}", c.category), c.normalized_score))
            .collect()
    }
}
