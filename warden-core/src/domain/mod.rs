pub mod error;
pub mod finding;
pub mod graph;
pub mod ports;
pub mod project;
pub mod report;
pub mod rules;
pub mod scoring;
pub mod source;
pub mod text;

// Convenient re-exports to simplify imports elsewhere
pub use error::DomainError;
pub use finding::{Finding, FindingSink, Location, Severity};
pub use report::{PassOutcome, ValidationReport};
pub use scoring::{CategoryScore, Grade, ScoreCard};
pub use source::SourceFile;
