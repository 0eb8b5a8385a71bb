pub mod imports;

pub use imports::{ImportGraph, Linkage, join_normalized, linkages, resolve};
