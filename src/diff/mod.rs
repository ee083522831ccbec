//! Local vs remote playlist divergence.
//!
//! - [`engine`]: pure, deterministic divergence computation
//! - [`model`]: items, snapshots, reports and summaries
//! - [`export`]: human-readable report file
//! - [`display`]: coloured printing of an exported report

pub mod display;
pub mod engine;
pub mod export;
pub mod model;

pub use engine::compute_divergence;
pub use model::{DivergenceReport, Group, Item, Rename, Snapshot, Summary};
