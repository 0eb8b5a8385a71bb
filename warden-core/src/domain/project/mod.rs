// warden-core/src/domain/project/mod.rs

pub mod configuration;

pub use configuration::{LayerRule, PRESENTATION_LAYER, ProjectConfig, Thresholds};
