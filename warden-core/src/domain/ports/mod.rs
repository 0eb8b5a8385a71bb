// src/domain/ports/mod.rs

pub mod clock;

pub use clock::{Clock, FixedClock};
