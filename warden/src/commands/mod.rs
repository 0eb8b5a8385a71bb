// warden/src/commands/mod.rs

pub mod check;
pub mod fix;
pub mod list;

use std::path::Path;
use std::sync::Arc;

use warden_core::infrastructure::FsCorpus;
use warden_core::infrastructure::config::project::load_project_config;
use warden_core::ports::validator::ProjectContext;

/// Loads the configuration and wires the filesystem corpus for one run.
pub(crate) fn project_context(
    project_dir: &Path,
    config_file: Option<&Path>,
) -> anyhow::Result<ProjectContext> {
    let config = load_project_config(project_dir, config_file)?;
    let corpus = Arc::new(FsCorpus::new(project_dir, &config));
    Ok(ProjectContext::new(project_dir, Arc::new(config), corpus))
}
