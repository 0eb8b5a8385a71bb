// warden-core/src/infrastructure/mod.rs

pub mod clock;
pub mod config;
pub mod error;
pub mod fs;
pub mod scanner;

pub use clock::SystemClock;
pub use scanner::FsCorpus;
