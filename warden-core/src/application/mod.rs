// warden-core/src/application/mod.rs

pub mod orchestrator;
pub mod passes;
pub mod remediation;
pub mod report;

// --- RE-EXPORTS (FACADE PATTERN) ---
// The CLI only needs `use warden_core::application::{Orchestrator, build_plan, apply_plan};`

pub use orchestrator::{Orchestrator, enabled_validators, run_isolated};
pub use passes::autofix::build_plan;
pub use passes::registry;
pub use remediation::{ApplyReport, FileEdit, FixPlan, apply_plan};
pub use report::{render_markdown, write_report};
