pub mod env_files;
pub mod manifest;
pub mod pipelines;
pub mod project;
pub mod tsconfig;

pub use crate::domain::project::ProjectConfig;
pub use manifest::PackageManifest;
pub use pipelines::{Pipeline, load_pipelines};
pub use project::{load_project_config, load_project_config_with};
pub use tsconfig::TsConfig;
