// warden-core/src/lib.rs

// 1. Mandatory documentation for production code
#![allow(missing_docs)]

// 2. Memory safety
#![deny(unsafe_code)]
// 3. Robustness
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
// 4. Performance
#![warn(clippy::perf)]

// --- HEXAGONAL MODULES ---

// 1. Ports (Interfaces / Traits)
// The validator contract every analysis pass implements.
pub mod ports;

// 2. Domain (pure logic)
// Findings, severities, scoring, import graph, rules, report model.
// Depends on nothing else in the crate.
pub mod domain;

// 3. Infrastructure (Adapters)
// Filesystem scanning, configuration and manifest readers, atomic writes.
pub mod infrastructure;

// 4. Application (Use Cases)
// Analysis passes, orchestration, report generation, remediation.
pub mod application;

// --- GLOBAL ERROR HANDLING ---
pub mod error;

// --- RE-EXPORTS (FACADE) ---
pub use error::WardenError;
