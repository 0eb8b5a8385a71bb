// warden-core/src/ports/mod.rs

pub mod corpus;
pub mod validator;

pub use corpus::{CorpusSource, ScanFilter};
pub use validator::{PassSummary, ProjectContext, Validator};
