// warden-core/src/domain/finding.rs

use serde::{Deserialize, Serialize};
use std::fmt;

// Ascending discriminants make `Severity::Low < Severity::Critical` free at runtime,
// which is what the `fail_on` threshold comparison relies on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Low, // 1
    Medium,   // 2
    High,     // 3
    Critical, // 4
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];

    /// Fixed weight shared by every pass and by the scoring engine.
    pub const fn weight(self) -> u32 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::Critical => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(format!("Unknown severity: {}", s)),
        }
    }
}

/// Where a finding points. Project-level findings use a collaborator file or `.`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub file: String,
    pub line: Option<usize>,
}

impl Location {
    pub fn file(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line: None,
        }
    }

    pub fn line(file: impl Into<String>, line: usize) -> Self {
        Self {
            file: file.into(),
            line: Some(line),
        }
    }

    pub fn project() -> Self {
        Self::file(".")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub validator: String,
    pub severity: Severity,
    pub category: String,
    pub message: String,
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl Finding {
    pub fn location(&self) -> String {
        match self.line {
            Some(line) => format!("{}:{}", self.file, line),
            None => self.file.clone(),
        }
    }

    /// One-line rendering used for report bullets and CLI output.
    pub fn render(&self) -> String {
        format!(
            "[{}] {}: {} ({})",
            self.severity.label(),
            self.category,
            self.message,
            self.location()
        )
    }
}

/// Append-only buffer handed to a single pass.
///
/// A pass can only push into its own sink; the orchestrator owns the sinks and
/// keeps whatever was pushed even when the pass fails halfway.
#[derive(Debug)]
pub struct FindingSink {
    validator: String,
    findings: Vec<Finding>,
}

impl FindingSink {
    pub fn new(validator: impl Into<String>) -> Self {
        Self {
            validator: validator.into(),
            findings: Vec::new(),
        }
    }

    pub fn validator(&self) -> &str {
        &self.validator
    }

    pub fn emit(
        &mut self,
        severity: Severity,
        category: impl Into<String>,
        location: Location,
        message: impl Into<String>,
    ) {
        self.findings.push(Finding {
            validator: self.validator.clone(),
            severity,
            category: category.into(),
            message: message.into(),
            file: location.file,
            line: location.line,
        });
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn in_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Finding> {
        self.findings.iter().filter(move |f| f.category == category)
    }

    pub fn into_findings(self) -> Vec<Finding> {
        self.findings
    }
}
