//! Experiment module for podmatch
//!
//! Handles deterministic A/B variant assignment (auto-join vs.
//! prompted) and the best-effort outcome audit log.

mod outcomes;
mod variants;

pub use outcomes::{OutcomeSink, SqliteOutcomeLog};
pub use variants::{assign_variant, assign_variant_with, SqliteVariantStore, VariantStore};
